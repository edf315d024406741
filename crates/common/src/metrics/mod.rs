//! Metrics and observability utilities
//!
//! Prometheus metrics with latency-oriented histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ScholarHub metrics
pub const METRICS_PREFIX: &str = "scholarhub";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of catalog search queries"
    );

    describe_histogram!(
        format!("{}_search_results", METRICS_PREFIX),
        Unit::Count,
        "Papers plus datasets matched by a search query"
    );

    describe_counter!(
        format!("{}_bookmarks_total", METRICS_PREFIX),
        Unit::Count,
        "Bookmark changes by kind and action"
    );

    describe_counter!(
        format!("{}_auth_events_total", METRICS_PREFIX),
        Unit::Count,
        "Registrations and login attempts by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one catalog search and how much it matched
pub fn record_search(papers: u64, datasets: u64) {
    counter!(format!("{}_search_queries_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_search_results", METRICS_PREFIX)).record((papers + datasets) as f64);
}

/// Record a bookmark change; `kind` is e.g. "interesting_paper"
pub fn record_bookmark(kind: &'static str, action: &'static str) {
    counter!(
        format!("{}_bookmarks_total", METRICS_PREFIX),
        "kind" => kind,
        "action" => action
    )
    .increment(1);
}

/// Record a registration or login outcome
pub fn record_auth(event: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        format!("{}_auth_events_total", METRICS_PREFIX),
        "event" => event,
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
        assert!(LATENCY_BUCKETS.contains(&0.050));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every call is a no-op.
        let metrics = RequestMetrics::start("GET", "/api/papers");
        metrics.finish(200);
        record_search(3, 1);
        record_bookmark("interesting_paper", "mark");
        record_auth("login", false);
    }
}
