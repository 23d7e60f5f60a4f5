//! Metrics collection and exposition.
//!
//! # Metrics
//! - `kfrs_requests_total` (counter): requests by response status
//! - `kfrs_request_duration_seconds` (histogram): handler latency
//! - `kfrs_blocked_requests_total` (counter): requests rejected by a ban
//! - `kfrs_bans_total` (counter): bans issued
//! - `kfrs_tracked_clients` (gauge): addresses held by the access guard
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve Prometheus metrics on `addr`. Must be called inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    counter!("kfrs_requests_total", "status" => status.to_string()).increment(1);
    histogram!("kfrs_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_blocked() {
    counter!("kfrs_blocked_requests_total").increment(1);
}

pub fn record_ban() {
    counter!("kfrs_bans_total").increment(1);
}

pub fn set_tracked_clients(count: usize) {
    gauge!("kfrs_tracked_clients").set(count as f64);
}
