//! Tracking page fetcher
//!
//! Thin HTTP collaborator: one GET per call, fixed timeout, no retries.
//! Anything that is not a 2xx body comes back as a `FetchError`.

use crate::domain::{RawDocument, TrackingNumber};
use crate::infra::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

pub const TRACKING_NUMBER_PLACEHOLDER: &str = "{tracking_number}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Other(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Connection(_) => "connection",
            FetchError::Status(_) => "status",
            FetchError::Other(_) => "other",
        }
    }
}

/// Source of raw tracking pages
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, number: &TrackingNumber) -> Result<RawDocument, FetchError>;
}

/// Log fetch failure (cold path)
#[cold]
fn log_fetch_failed(number: &TrackingNumber, latency_ms: u64, e: &FetchError) {
    error!(
        tracking_number = %number,
        latency_ms = %latency_ms,
        kind = %e.kind(),
        error = %e,
        "tracking_fetch_failed"
    );
}

/// Fetches the carrier's public tracking page over HTTPS
pub struct HttpFetcher {
    client: reqwest::Client,
    url_template: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.fetch_timeout_ms());

        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.fetch_user_agent())
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        if !config.fetch_url_template().contains(TRACKING_NUMBER_PLACEHOLDER) {
            warn!(
                url_template = %config.fetch_url_template(),
                "fetch_url_template_missing_placeholder"
            );
        }

        Ok(Self { client, url_template: config.fetch_url_template().to_string(), timeout })
    }

    pub fn url_for(&self, number: &TrackingNumber) -> String {
        build_url(&self.url_template, number)
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, number: &TrackingNumber) -> Result<RawDocument, FetchError> {
        let start = Instant::now();
        let url = self.url_for(number);

        let result = async {
            let response = self
                .client
                .get(&url)
                .header("Accept", "text/html,application/xhtml+xml")
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await
                .map_err(|e| self.map_error(e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.bytes().await.map_err(|e| self.map_error(e))?;
            Ok(RawDocument::from_bytes(number.clone(), &body))
        }
        .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(doc) => info!(
                tracking_number = %number,
                latency_ms = %latency_ms,
                bytes = %doc.len(),
                "tracking_fetched"
            ),
            Err(e) => log_fetch_failed(number, latency_ms, e),
        }
        result
    }
}

/// Substitute the tracking number into a URL template
pub fn build_url(template: &str, number: &TrackingNumber) -> String {
    template.replace(TRACKING_NUMBER_PLACEHOLDER, number.as_str())
}
