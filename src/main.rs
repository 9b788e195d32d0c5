//! carrier-track - HTTP service returning carrier tracking records as JSON
//!
//! Module structure:
//! - `domain/` - Core types (TrackingNumber, RawDocument, TrackingRecord)
//! - `io/` - External interfaces (upstream fetcher, HTTP API)
//! - `services/` - Extraction and the fetch + extract pipeline
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use carrier_track::infra::{Config, Metrics};
use carrier_track::io::{start_api_server, HttpFetcher};
use carrier_track::services::{TrackingExtractor, TrackingService};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Carrier tracking API server
#[derive(Parser, Debug)]
#[command(name = "carrier-track", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug for per-request and per-step visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "carrier-track starting");

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).with_env_overrides();

    info!(
        config_file = %config.config_file(),
        bind_address = %config.bind_address(),
        port = %config.port(),
        fetch_url_template = %config.fetch_url_template(),
        fetch_timeout_ms = %config.fetch_timeout_ms(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        "config_loaded"
    );

    let addr: SocketAddr = format!("{}:{}", config.bind_address(), config.port())
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address(), config.port()))?;

    let extractor = TrackingExtractor::from_marker_set(config.markers())
        .context("Invalid [markers] selector in configuration")?;
    let fetcher = HttpFetcher::new(&config)?;
    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(TrackingService::new(fetcher, extractor, metrics.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Periodic metrics log (disabled when interval is 0)
    let interval_secs = config.metrics_interval_secs();
    if interval_secs > 0 {
        let mut reporter_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            // First tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => metrics.report().log(),
                    _ = reporter_shutdown.changed() => {
                        if *reporter_shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    start_api_server(addr, service, shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("API server failed")?;

    info!("carrier-track shutdown complete");
    Ok(())
}
