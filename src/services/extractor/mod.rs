//! Tracking page extractor
//!
//! Turns a fetched tracking page into a `TrackingRecord`. Pure and synchronous:
//! no I/O, no shared mutable state, safe to call from any number of tasks.
//!
//! Pipeline:
//! 1. Not-found detection (marker text, then marker element)
//! 2. Delivery banner (`estimate`)
//! 3. Timeline steps (`history`)
//!
//! All text passes through `normalize` before it reaches the record.

mod estimate;
mod history;
pub mod markers;
pub mod normalize;

#[cfg(test)]
mod tests;

pub use estimate::extract_estimate;
pub use history::extract_history;
pub use markers::{MarkerError, MarkerSet, Markers};
pub use normalize::normalize;

use crate::domain::{RawDocument, TrackingRecord};
use crate::io::fetcher::FetchError;
use scraper::Html;
use thiserror::Error;
use tracing::debug;

/// Terminal extraction failures. Missing optional fields are never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The carrier says it has no tracking data for this number
    #[error("Tracking number not found according to USPS.")]
    NotFound,
    /// Page parsed but carried neither a delivery banner nor any history.
    /// Either a genuinely empty record or markup the markers no longer match.
    #[error("Tracking information not found or failed to parse. The parser may need an update or the request was blocked.")]
    Empty,
}

/// Outcome of looking at a fetch result before extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    Ok,
    NotFound,
    /// Transport failure reported by the fetcher
    Blocked,
}

impl PageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageClass::Ok => "ok",
            PageClass::NotFound => "not_found",
            PageClass::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackingExtractor {
    markers: Markers,
}

impl TrackingExtractor {
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }

    pub fn from_marker_set(set: &MarkerSet) -> Result<Self, MarkerError> {
        Markers::compile(set).map(Self::new)
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Classify a fetch outcome. Transport failures are `Blocked`; a page
    /// carrying the not-found marker is `NotFound`.
    pub fn classify(&self, fetched: Result<&RawDocument, &FetchError>) -> PageClass {
        match fetched {
            Err(_) => PageClass::Blocked,
            Ok(raw) => {
                if self.markers.has_not_found_text(&raw.body) {
                    return PageClass::NotFound;
                }
                let doc = Html::parse_document(&raw.body);
                if self.markers.has_error_page(&doc) {
                    PageClass::NotFound
                } else {
                    PageClass::Ok
                }
            }
        }
    }

    /// Extract the tracking record from a fetched page
    pub fn extract(&self, raw: &RawDocument) -> Result<TrackingRecord, ExtractionError> {
        // Cheap substring check before paying for a parse
        if self.markers.has_not_found_text(&raw.body) {
            debug!(tracking_number = %raw.requested, reason = "text", "tracking_page_not_found");
            return Err(ExtractionError::NotFound);
        }

        let doc = Html::parse_document(&raw.body);
        if self.markers.has_error_page(&doc) {
            debug!(tracking_number = %raw.requested, reason = "element", "tracking_page_not_found");
            return Err(ExtractionError::NotFound);
        }

        let record = TrackingRecord {
            tracking_number: self.tracking_number(&doc, raw),
            estimate: extract_estimate(&doc, &self.markers),
            history: extract_history(&doc, &self.markers),
        };

        if record.is_uninformative() {
            debug!(tracking_number = %raw.requested, bytes = %raw.len(), "tracking_page_empty");
            return Err(ExtractionError::Empty);
        }

        debug!(
            tracking_number = %record.tracking_number,
            has_estimate = %record.estimate.is_some(),
            events = %record.history.len(),
            "tracking_extracted"
        );
        Ok(record)
    }

    /// Number printed on the page, falling back to the one requested
    fn tracking_number(&self, doc: &Html, raw: &RawDocument) -> String {
        let shown = self.markers.tracking_number(doc).map(markers::element_text);
        normalize::normalize_non_empty(shown.as_deref())
            .unwrap_or_else(|| raw.requested.as_str().to_string())
    }
}
