//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route kind and status
//! - `proxy_request_duration_seconds` (histogram): time to response headers,
//!   by route kind and status
//! - `proxy_errors_total` (counter): failed requests by error kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Route label for requests that matched no route.
pub const UNROUTED: &str = "unrouted";

/// Record a completed request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("proxy_requests_total", "route" => route, "status" => status.clone())
        .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request that failed inside the proxy.
pub fn record_error(kind: &'static str) {
    metrics::counter!("proxy_errors_total", "kind" => kind).increment(1);
}
