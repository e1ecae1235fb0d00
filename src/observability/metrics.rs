//! Metrics collection and exposition.
//!
//! # Metrics
//! - `brick_requests_total` (counter): dispatched requests by method, status, route
//! - `brick_request_duration_seconds` (histogram): dispatch latency
//! - `brick_cache_loads_total` (counter): route cache loads by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - The route label is the route's template, never the concrete path, to
//!   keep cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    metrics::counter!("brick_requests_total", &labels).increment(1);
    metrics::histogram!("brick_request_duration_seconds", &labels).record(started.elapsed().as_secs_f64());
}

pub fn record_cache_load(outcome: &'static str) {
    metrics::counter!("brick_cache_loads_total", "outcome" => outcome).increment(1);
}
