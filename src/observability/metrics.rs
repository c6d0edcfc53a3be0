//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_server_requests_total` (counter): requests by endpoint, protocol, operation, status
//! - `http_server_request_duration_seconds` (histogram): latency by endpoint, protocol, operation
//! - `http_server_active_requests` (gauge): in-flight requests per endpoint
//!
//! # Design Decisions
//! - Labels use the final operation name, never the raw path
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::net::endpoint::{Endpoint, Protocol};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Labels shared by every per-request metric.
#[derive(Debug, Clone)]
pub struct RequestLabels {
    pub endpoint: Endpoint,
    pub protocol: Protocol,
    pub method: String,
    pub operation: String,
}

pub fn record_request(labels: &RequestLabels, status: u16, start: Instant) {
    let interface = labels.endpoint.interface().to_string();
    let port = labels.endpoint.port().to_string();
    let protocol = labels.protocol.as_str();

    counter!(
        "http_server_requests_total",
        "interface" => interface.clone(),
        "port" => port.clone(),
        "protocol" => protocol,
        "method" => labels.method.clone(),
        "operation" => labels.operation.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "http_server_request_duration_seconds",
        "interface" => interface,
        "port" => port,
        "protocol" => protocol,
        "method" => labels.method.clone(),
        "operation" => labels.operation.clone()
    )
    .record(start.elapsed().as_secs_f64());
}

fn active_requests(endpoint: &Endpoint) -> metrics::Gauge {
    gauge!(
        "http_server_active_requests",
        "interface" => endpoint.interface().to_string(),
        "port" => endpoint.port().to_string()
    )
}

/// A request started on `endpoint`.
pub fn increment_active_requests(endpoint: &Endpoint) {
    active_requests(endpoint).increment(1.0);
}

/// A request on `endpoint` finished or was cancelled.
pub fn decrement_active_requests(endpoint: &Endpoint) {
    active_requests(endpoint).decrement(1.0);
}
