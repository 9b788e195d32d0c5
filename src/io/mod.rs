//! I/O - external interfaces
//!
//! - `api` - HTTP API exposing tracking lookups (hyper)
//! - `fetcher` - Upstream tracking page fetcher (reqwest)

pub mod api;
pub mod fetcher;

// Re-export commonly used types
pub use api::start_api_server;
pub use fetcher::{DocumentFetcher, FetchError, HttpFetcher};
