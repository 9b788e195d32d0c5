//! Lock-free request metrics and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! Only `report()` touches the mutex guarding the last report time.
//!
//! NOTE: All atomics use Relaxed ordering; these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Fetch latency bucket boundaries (milliseconds)
/// Buckets: ≤50, ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, >25600
pub const FETCH_BUCKET_BOUNDS: [u64; 10] = [50, 100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600];
pub const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_ms: u64) -> usize {
    FETCH_BUCKET_BOUNDS.partition_point(|&bound| bound < latency_ms)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Load all bucket values without resetting
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile).ceil() as u64;
    let mut cumulative = 0u64;

    // Last bucket uses 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [50, 100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Final result of one tracking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    InvalidInput,
    NotFound,
    Empty,
    FetchFailed,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::InvalidInput => "invalid_input",
            RequestOutcome::NotFound => "not_found",
            RequestOutcome::Empty => "empty",
            RequestOutcome::FetchFailed => "fetch_failed",
        }
    }
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Tracking requests received (monotonic)
    requests_total: AtomicU64,
    /// Requests since last report (reset on report)
    requests_since_report: AtomicU64,
    success_total: AtomicU64,
    invalid_total: AtomicU64,
    not_found_total: AtomicU64,
    empty_total: AtomicU64,
    fetch_failed_total: AtomicU64,
    /// Fetch latency histogram buckets (monotonic, Prometheus style)
    fetch_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of fetch latencies in ms (monotonic)
    fetch_latency_sum_ms: AtomicU64,
    /// Max fetch latency in ms (reset on report)
    fetch_latency_max_ms: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_since_report: AtomicU64::new(0),
            success_total: AtomicU64::new(0),
            invalid_total: AtomicU64::new(0),
            not_found_total: AtomicU64::new(0),
            empty_total: AtomicU64::new(0),
            fetch_failed_total: AtomicU64::new(0),
            fetch_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            fetch_latency_sum_ms: AtomicU64::new(0),
            fetch_latency_max_ms: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a finished tracking request (lock-free)
    #[inline]
    pub fn record_request(&self, outcome: RequestOutcome) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_since_report.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            RequestOutcome::Success => &self.success_total,
            RequestOutcome::InvalidInput => &self.invalid_total,
            RequestOutcome::NotFound => &self.not_found_total,
            RequestOutcome::Empty => &self.empty_total,
            RequestOutcome::FetchFailed => &self.fetch_failed_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record upstream fetch latency, successful or not (lock-free)
    #[inline]
    pub fn record_fetch_latency(&self, latency_ms: u64) {
        self.fetch_latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.fetch_latency_buckets[bucket_index(latency_ms)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.fetch_latency_max_ms, latency_ms);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Snapshot counters; resets the per-interval values
    pub fn report(&self) -> MetricsSummary {
        let requests_since_report = self.requests_since_report.swap(0, Ordering::Relaxed);
        let fetch_latency_max_ms = self.fetch_latency_max_ms.swap(0, Ordering::Relaxed);
        let fetch_buckets = load_buckets(&self.fetch_latency_buckets);
        let fetch_count: u64 = fetch_buckets.iter().sum();
        let fetch_latency_sum_ms = self.fetch_latency_sum_ms.load(Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let requests_per_min = if elapsed.as_secs_f64() > 0.0 {
            requests_since_report as f64 * 60.0 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        MetricsSummary {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_per_min,
            success_total: self.success_total.load(Ordering::Relaxed),
            invalid_total: self.invalid_total.load(Ordering::Relaxed),
            not_found_total: self.not_found_total.load(Ordering::Relaxed),
            empty_total: self.empty_total.load(Ordering::Relaxed),
            fetch_failed_total: self.fetch_failed_total.load(Ordering::Relaxed),
            fetch_count,
            fetch_latency_sum_ms,
            fetch_latency_avg_ms: fetch_latency_sum_ms.checked_div(fetch_count).unwrap_or(0),
            fetch_latency_max_ms,
            fetch_latency_p50_ms: percentile_from_buckets(&fetch_buckets, 0.50),
            fetch_latency_p99_ms: percentile_from_buckets(&fetch_buckets, 0.99),
            fetch_buckets,
        }
    }
}

/// Point-in-time view of the metrics
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub requests_total: u64,
    pub requests_per_min: f64,
    pub success_total: u64,
    pub invalid_total: u64,
    pub not_found_total: u64,
    pub empty_total: u64,
    pub fetch_failed_total: u64,
    pub fetch_count: u64,
    pub fetch_latency_sum_ms: u64,
    pub fetch_latency_avg_ms: u64,
    pub fetch_latency_max_ms: u64,
    pub fetch_latency_p50_ms: u64,
    pub fetch_latency_p99_ms: u64,
    pub fetch_buckets: [u64; NUM_BUCKETS],
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            requests_total = %self.requests_total,
            requests_per_min = format!("{:.1}", self.requests_per_min),
            success = %self.success_total,
            not_found = %self.not_found_total,
            empty = %self.empty_total,
            fetch_failed = %self.fetch_failed_total,
            invalid = %self.invalid_total,
            fetch_avg_ms = %self.fetch_latency_avg_ms,
            fetch_p99_ms = %self.fetch_latency_p99_ms,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.requests_total(), 0);
        let summary = metrics.report();
        assert_eq!(summary.fetch_count, 0);
        assert_eq!(summary.fetch_latency_avg_ms, 0);
        assert_eq!(summary.fetch_latency_p99_ms, 0);
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = Metrics::new();
        metrics.record_request(RequestOutcome::Success);
        metrics.record_request(RequestOutcome::Success);
        metrics.record_request(RequestOutcome::NotFound);
        metrics.record_request(RequestOutcome::FetchFailed);
        metrics.record_request(RequestOutcome::InvalidInput);

        let summary = metrics.report();
        assert_eq!(summary.requests_total, 5);
        assert_eq!(summary.success_total, 2);
        assert_eq!(summary.not_found_total, 1);
        assert_eq!(summary.fetch_failed_total, 1);
        assert_eq!(summary.invalid_total, 1);
        assert_eq!(summary.empty_total, 0);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(50), 0);
        assert_eq!(bucket_index(51), 1);
        assert_eq!(bucket_index(25600), 9);
        assert_eq!(bucket_index(30000), 10);
    }

    #[test]
    fn test_fetch_latency_summary() {
        let metrics = Metrics::new();
        metrics.record_fetch_latency(40);
        metrics.record_fetch_latency(300);
        metrics.record_fetch_latency(900);
        metrics.record_fetch_latency(20_000);

        let summary = metrics.report();
        assert_eq!(summary.fetch_count, 4);
        assert_eq!(summary.fetch_latency_sum_ms, 21_240);
        assert_eq!(summary.fetch_latency_avg_ms, 5_310);
        assert_eq!(summary.fetch_latency_max_ms, 20_000);
        assert_eq!(summary.fetch_latency_p50_ms, 400);
        assert_eq!(summary.fetch_latency_p99_ms, 25_600);

        // Max resets per interval, histogram does not
        let again = metrics.report();
        assert_eq!(again.fetch_latency_max_ms, 0);
        assert_eq!(again.fetch_count, 4);
    }
}
