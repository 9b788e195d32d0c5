//! Services - extraction logic and the request pipeline
//!
//! - `extractor` - Tracking page → `TrackingRecord` (pure, no I/O)
//! - `tracking` - Fetch + extract pipeline with metrics

pub mod extractor;
pub mod tracking;

// Re-export commonly used types
pub use extractor::{ExtractionError, PageClass, TrackingExtractor};
pub use tracking::{TrackError, TrackingService};
