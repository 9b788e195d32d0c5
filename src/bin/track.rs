//! One-shot tracking lookup
//!
//! Usage:
//!   cargo run --bin track -- 9400150105501041088569          # Fetch live page
//!   cargo run --bin track -- --file saved.html --number 9400150105501041088569
//!   cargo run --bin track -- --file 9400150105501041088569.html --pretty
//!   cargo run --bin track -- 9400150105501041088569 --classify
//!
//! Prints the JSON record on stdout. Logs go to stderr.

use anyhow::{bail, Context};
use carrier_track::domain::{RawDocument, TrackingNumber, TrackingRecord};
use carrier_track::infra::{Config, Metrics};
use carrier_track::io::{DocumentFetcher, HttpFetcher};
use carrier_track::services::{TrackingExtractor, TrackingService};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "track")]
#[command(about = "Fetch or parse a tracking page and print the record as JSON")]
struct Args {
    /// Tracking number to look up
    number: Option<String>,

    /// Parse a saved tracking page instead of fetching
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Tracking number the saved page belongs to (defaults to the file stem)
    #[arg(short = 'n', long = "number", value_name = "NUMBER")]
    page_number: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the page class instead of the record
    #[arg(long)]
    classify: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn print_record(record: &TrackingRecord, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    println!("{json}");
    Ok(())
}

/// Tracking number for an offline page: explicit flag first, then the file stem
fn offline_number(explicit: Option<&str>, path: &Path) -> anyhow::Result<TrackingNumber> {
    if let Some(raw) = explicit {
        return TrackingNumber::parse(raw).with_context(|| format!("Invalid tracking number {raw:?}"));
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    TrackingNumber::parse(stem).with_context(|| {
        format!("File stem {stem:?} is not a tracking number; pass --number")
    })
}

fn run_offline(args: &Args, path: &Path, extractor: &TrackingExtractor) -> anyhow::Result<()> {
    let number = offline_number(
        args.page_number.as_deref().or(args.number.as_deref()),
        path,
    )?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = RawDocument::from_bytes(number, &bytes);

    if args.classify {
        println!("{}", extractor.classify(Ok(&raw)).as_str());
        return Ok(());
    }

    let record = extractor.extract(&raw)?;
    print_record(&record, args.pretty)
}

async fn run_live(args: &Args, config: &Config, extractor: TrackingExtractor) -> anyhow::Result<()> {
    let Some(raw) = args.number.as_deref() else {
        bail!("Provide a tracking number or --file");
    };
    let number = TrackingNumber::parse(raw).with_context(|| format!("Invalid tracking number {raw:?}"))?;
    let fetcher = HttpFetcher::new(config)?;

    if args.classify {
        let fetched = fetcher.fetch(&number).await;
        println!("{}", extractor.classify(fetched.as_ref()).as_str());
        return Ok(());
    }

    let service = TrackingService::new(fetcher, extractor, Arc::new(Metrics::new()));
    let record = service.track(&number).await?;
    print_record(&record, args.pretty)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref());
    if let Some(ms) = args.timeout_ms {
        config = config.with_fetch_timeout_ms(ms);
    }

    let extractor = TrackingExtractor::from_marker_set(config.markers())
        .context("Invalid [markers] selector in configuration")?;

    match args.file.as_deref() {
        Some(path) => run_offline(&args, path, &extractor),
        None => run_live(&args, &config, extractor).await,
    }
}
