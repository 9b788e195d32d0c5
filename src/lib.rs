//! Carrier tracking library
//!
//! Fetches a carrier's public tracking page and extracts a structured record.
//! Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
