//! Domain models - tracking record and shared value types
//!
//! - `TrackingRecord` - normalized output for one shipment
//! - `DeliveryEstimate` - banner data (status title, ETA parts)
//! - `HistoryEvent` - one entry of the tracking timeline
//! - `TrackingNumber` - validated request identifier
//! - `RawDocument` - fetched page handed to the extractor

pub mod record;
pub mod types;

// Re-export commonly used types at module level
pub use record::{DeliveryEstimate, HistoryEvent, TrackingRecord};
pub use types::{RawDocument, TrackingNumber, TrackingNumberError};
