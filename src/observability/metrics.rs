//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status, action
//! - `gate_request_duration_seconds` (histogram): end-to-end latency
//! - `gate_auth_decisions_total` (counter): auth gate outcomes
//! - `gate_upstream_failures_total` (counter): backend failures by kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, action: &'static str, start: Instant) {
    let status = status.to_string();
    counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "action" => action
    )
    .increment(1);
    histogram!(
        "gate_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
        "action" => action
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an auth gate outcome.
pub fn record_auth(outcome: &'static str) {
    counter!("gate_auth_decisions_total", "outcome" => outcome).increment(1);
}

/// Record a failed backend call.
pub fn record_upstream_failure(kind: &'static str) {
    counter!("gate_upstream_failures_total", "kind" => kind).increment(1);
}
