//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Build the selected binding from validated configuration
//! - Run it until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The receive loop starts last

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::connection::{
    Connection, ConnectionError, GatewayConnection, SharedApplication, SocketConnection,
    TransportError,
};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::transport::{ConfigurationError, TokioSpawner};

/// Which transport to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// ZeroMQ proxy (PULL/PUB).
    #[default]
    Socket,
    /// Local HTTP gateway.
    Gateway,
}

/// Failures before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to connect to proxy: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Build the selected binding and serve `application` until `shutdown` fires.
pub async fn serve(
    config: &AppConfig,
    binding: Binding,
    application: SharedApplication,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match binding {
        Binding::Socket => {
            let spawner = Arc::new(TokioSpawner::current()?);
            let connection = SocketConnection::connect(&config.socket, spawner)?;
            run(connection, application, shutdown).await?;
        }
        Binding::Gateway => {
            tracing::info!(port = config.gateway.port, "Serving gateway");
            run(GatewayConnection::new(config.gateway.port), application, shutdown).await?;
        }
    }
    Ok(())
}

/// Run any connection against the shared shutdown signal.
pub async fn run<C: Connection>(
    connection: C,
    application: SharedApplication,
    shutdown: &Shutdown,
) -> Result<(), ConnectionError> {
    connection.run(application, shutdown.subscribe()).await
}
