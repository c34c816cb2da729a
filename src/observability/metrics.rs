//! Metrics collection and exposition.
//!
//! # Metrics
//! - `leave_requests_total` (counter): responses by route, status
//! - `leave_gate_rejections_total` (counter): gate rejections by stage
//! - `leave_captcha_checks_total` (counter): verification outcomes
//! - `leave_store_records` (gauge): records currently stored

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &'static str, status: u16) {
    counter!("leave_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}

pub fn record_gate_rejection(stage: &'static str) {
    counter!("leave_gate_rejections_total", "stage" => stage).increment(1);
}

pub fn record_captcha(outcome: &'static str) {
    counter!("leave_captcha_checks_total", "outcome" => outcome).increment(1);
}

pub fn record_store_size(records: usize) {
    gauge!("leave_store_records").set(records as f64);
}
