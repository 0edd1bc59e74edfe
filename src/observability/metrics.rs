//! Metrics collection and exposition.
//!
//! # Metrics
//! - `m2_messages_received_total` (counter): raw messages read from the inbound socket
//! - `m2_replies_sent_total` (counter): envelopes written to the outbound socket
//! - `m2_disconnects_total` (counter): client disconnect notifications
//! - `m2_dispatch_failures_total` (counter, `reason`): messages dropped by a task
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_message_received() {
    metrics::counter!("m2_messages_received_total").increment(1);
}

pub fn record_reply_sent() {
    metrics::counter!("m2_replies_sent_total").increment(1);
}

pub fn record_disconnect() {
    metrics::counter!("m2_disconnects_total").increment(1);
}

pub fn record_dispatch_failure(reason: &'static str) {
    metrics::counter!("m2_dispatch_failures_total", "reason" => reason).increment(1);
}
