//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frps_acl_plugin_requests_total` (counter): plugin calls by op, outcome
//! - `frps_acl_admin_operations_total` (counter): admin mutations by op, code
//! - `frps_acl_users` (gauge): users currently in the token store
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// `op` must come from a fixed set; see `Operation::metric_label`.
pub fn record_plugin_request(op: &'static str, outcome: &'static str) {
    counter!("frps_acl_plugin_requests_total", "op" => op, "outcome" => outcome).increment(1);
}

pub fn record_admin_operation(op: &'static str, code: &'static str) {
    counter!("frps_acl_admin_operations_total", "op" => op, "code" => code).increment(1);
}

pub fn record_user_count(count: usize) {
    gauge!("frps_acl_users").set(count as f64);
}
