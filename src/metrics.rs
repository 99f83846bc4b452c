//! Prometheus metrics for TODO operations and HTTP latency.
//!
//! Counters are recorded by the service on successful writes; the HTTP
//! layer records request latency and failed responses.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// TODOs created counter metric name.
pub const METRIC_TODOS_CREATED: &str = "todos_created_total";
/// TODOs updated counter metric name.
pub const METRIC_TODOS_UPDATED: &str = "todos_updated_total";
/// TODOs deleted counter metric name.
pub const METRIC_TODOS_DELETED: &str = "todos_deleted_total";
/// Failed requests counter metric name.
pub const METRIC_REQUESTS_FAILED: &str = "todo_requests_failed_total";

/// Install the Prometheus recorder and register metric descriptions.
///
/// Returns `None` if a global recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            debug!("Metrics recorder not installed: {}", e);
            return None;
        }
    };

    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_TODOS_CREATED, "Total number of TODOs created");
    describe_counter!(METRIC_TODOS_UPDATED, "Total number of TODOs updated");
    describe_counter!(METRIC_TODOS_DELETED, "Total number of TODO rows deleted");
    describe_counter!(
        METRIC_REQUESTS_FAILED,
        "Total number of TODO requests answered with an error status"
    );

    debug!("Metrics initialized");
    Some(handle)
}

/// Increment TODOs created counter.
pub fn inc_todos_created() {
    counter!(METRIC_TODOS_CREATED).increment(1);
}

/// Increment TODOs updated counter.
pub fn inc_todos_updated() {
    counter!(METRIC_TODOS_UPDATED).increment(1);
}

/// Add deleted rows to the TODOs deleted counter.
pub fn inc_todos_deleted(rows: u64) {
    counter!(METRIC_TODOS_DELETED).increment(rows);
}

/// Increment failed requests counter for a status code.
pub fn inc_requests_failed(status: u16) {
    counter!(METRIC_REQUESTS_FAILED, "status" => status.to_string()).increment(1);
}

/// RAII guard for timing a request.
/// Records latency under the endpoint label when dropped.
pub struct RequestTimer {
    start: Instant,
    endpoint: &'static str,
}

impl RequestTimer {
    /// Start timing a request to `endpoint`.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => self.endpoint).record(self.elapsed_ms());
    }
}
