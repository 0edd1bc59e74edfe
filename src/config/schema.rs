//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Scheduler backend.
    pub runtime: RuntimeConfig,

    /// ZeroMQ proxy binding.
    pub socket: SocketConfig,

    /// HTTP gateway binding.
    pub gateway: GatewayConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Runtime backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `current_thread` or `multi_thread`.
    pub backend: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: "current_thread".to_string(),
        }
    }
}

/// Socket binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Endpoint the proxy pushes requests to (we connect a PULL socket).
    pub pull_address: String,

    /// Endpoint the proxy subscribes for replies on (we connect a PUB socket).
    pub pub_address: String,

    /// Envelopes queued for the publisher before handlers wait.
    pub outbox_capacity: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            pull_address: "tcp://127.0.0.1:9999".to_string(),
            pub_address: "tcp://127.0.0.1:9998".to_string(),
            outbox_capacity: 1024,
        }
    }
}

/// Gateway binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Port to listen on, all interfaces.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { port: 6767 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
