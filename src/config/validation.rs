//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - ZeroMQ endpoints must be `tcp://`, `ipc://` or `inproc://` URLs
//! - Value ranges (port and capacity non-zero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;
use crate::transport::Backend;

const ZMQ_SCHEMES: &[&str] = &["tcp", "ipc", "inproc"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a ZeroMQ endpoint")]
    InvalidEndpoint { field: &'static str, value: String },

    #[error("runtime.backend: unknown backend '{0}'")]
    UnknownBackend(String),

    #[error("gateway.port must be non-zero")]
    ZeroPort,

    #[error("socket.outbox_capacity must be greater than zero")]
    ZeroCapacity,

    #[error("observability.metrics_address: '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check `config` and report every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("socket.pull_address", &config.socket.pull_address),
        ("socket.pub_address", &config.socket.pub_address),
    ] {
        if !is_zmq_endpoint(value) {
            errors.push(ValidationError::InvalidEndpoint {
                field,
                value: value.clone(),
            });
        }
    }

    if config.runtime.backend.parse::<Backend>().is_err() {
        errors.push(ValidationError::UnknownBackend(config.runtime.backend.clone()));
    }

    if config.gateway.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.socket.outbox_capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_zmq_endpoint(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "tcp" => url.host_str().is_some() && url.port().is_some(),
        Ok(url) => ZMQ_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}
