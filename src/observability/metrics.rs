//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by mode and status
//! - `proxy_upstream_errors_total` (counter): failed dispatches by mode
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_target_selections_total` (counter): reverse target picks
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a request the proxy answered.
pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "mode" => mode, "status" => status.to_string()).increment(1);
    histogram!("proxy_request_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

/// Record an upstream dispatch failure.
pub fn record_upstream_error(mode: &'static str) {
    counter!("proxy_upstream_errors_total", "mode" => mode).increment(1);
}

/// Record which reverse target was chosen.
pub fn record_target_selection(target: String) {
    counter!("proxy_target_selections_total", "target" => target).increment(1);
}
