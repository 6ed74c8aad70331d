//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shim_requests_total` (counter): requests by method, status, path kind
//! - `shim_request_duration_seconds` (histogram): latency distribution
//! - `shim_rewrites_total` (counter): body rewrites by rule
//! - `shim_soft_404_total` (counter): 200s corrected to 404
//! - `shim_origin_resolutions_total` (counter): primary domain lookups by outcome
//! - `shim_forward_failures_total` (counter): write-path forwards that failed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::rewrite::RewriteStats;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, path_kind: &str, start: Instant) {
    counter!(
        "shim_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "path_kind" => path_kind.to_string()
    )
    .increment(1);
    histogram!("shim_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rewrites(stats: &RewriteStats) {
    for (rule, count) in stats.by_rule() {
        if count > 0 {
            counter!("shim_rewrites_total", "rule" => rule).increment(count as u64);
        }
    }
}

pub fn record_soft_404() {
    counter!("shim_soft_404_total").increment(1);
}

pub fn record_origin_resolution(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("shim_origin_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_forward_failure() {
    counter!("shim_forward_failures_total").increment(1);
}
