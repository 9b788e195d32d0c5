//! Fetch + extract pipeline for one tracking number
//!
//! One fetch and one extraction per call. No cache, no retries, no coalescing
//! of concurrent calls for the same number.

use crate::domain::{TrackingNumber, TrackingRecord};
use crate::infra::metrics::{Metrics, RequestOutcome};
use crate::io::fetcher::{DocumentFetcher, FetchError};
use crate::services::extractor::{ExtractionError, TrackingExtractor};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("Failed to retrieve data from USPS: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl TrackError {
    pub fn outcome(&self) -> RequestOutcome {
        match self {
            TrackError::Fetch(_) => RequestOutcome::FetchFailed,
            TrackError::Extraction(ExtractionError::NotFound) => RequestOutcome::NotFound,
            TrackError::Extraction(ExtractionError::Empty) => RequestOutcome::Empty,
        }
    }
}

pub struct TrackingService<F> {
    fetcher: F,
    extractor: TrackingExtractor,
    metrics: Arc<Metrics>,
}

impl<F: DocumentFetcher> TrackingService<F> {
    pub fn new(fetcher: F, extractor: TrackingExtractor, metrics: Arc<Metrics>) -> Self {
        Self { fetcher, extractor, metrics }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn extractor(&self) -> &TrackingExtractor {
        &self.extractor
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Fetch the page for `number` and extract its record
    pub async fn track(&self, number: &TrackingNumber) -> Result<TrackingRecord, TrackError> {
        let start = Instant::now();
        let fetched = self.fetcher.fetch(number).await;
        self.metrics.record_fetch_latency(start.elapsed().as_millis() as u64);

        // The parsed document is not Send; keep extraction free of awaits
        let result = fetched.map_err(TrackError::from).and_then(|raw| {
            self.extractor.extract(&raw).map_err(TrackError::from)
        });

        match &result {
            Ok(record) => {
                self.metrics.record_request(RequestOutcome::Success);
                info!(
                    tracking_number = %number,
                    events = %record.history.len(),
                    has_estimate = %record.estimate.is_some(),
                    total_ms = %start.elapsed().as_millis(),
                    "tracking_request_done"
                );
            }
            Err(e) => {
                let outcome = e.outcome();
                self.metrics.record_request(outcome);
                warn!(
                    tracking_number = %number,
                    outcome = %outcome.as_str(),
                    error = %e,
                    "tracking_request_failed"
                );
            }
        }
        result
    }
}
