//! Metrics and observability utilities
//!
//! Prometheus metrics with request latency histograms and
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Beans metrics
pub const METRICS_PREFIX: &str = "beans";

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
    // Request metrics
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

    // Catalogue metrics
    describe_counter!(
        format!("{}_coffees_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total coffees created, from forms and imports"
    );

    // Import metrics
    describe_counter!(
        format!("{}_imports_total", METRICS_PREFIX),
        Unit::Count,
        "Total CSV imports by outcome"
    );

    describe_counter!(
        format!("{}_import_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Total CSV rows imported"
    );

    describe_histogram!(
        format!("{}_import_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "CSV import latency in seconds"
    );

    // Auth metrics
    describe_counter!(
        format!("{}_login_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Total login attempts by channel and outcome"
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

/// Count a newly created coffee
pub fn record_coffee_created() {
    counter!(format!("{}_coffees_created_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record import metrics
pub fn record_import(duration_secs: f64, rows: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_imports_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    if success {
        counter!(format!("{}_import_rows_total", METRICS_PREFIX)).increment(rows as u64);
    }

    histogram!(
        format!("{}_import_duration_seconds", METRICS_PREFIX),
        "status" => status
    )
    .record(duration_secs);
}

/// Helper to record login attempts; `channel` is "web" or "api"
pub fn record_login(channel: &'static str, success: bool) {
    counter!(
        format!("{}_login_attempts_total", METRICS_PREFIX),
        "channel" => channel,
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}
