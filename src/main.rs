//! Echo server over either binding.
//!
//! ```text
//! m2-connections [--config app.toml] [--gateway]
//! ```
//!
//! Routes everything under `/echo` to the WebSocket-aware echo handler. Without
//! `--gateway` it connects to a proxy on the configured PULL/PUB endpoints.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use m2_connections::config::{load_config, AppConfig};
use m2_connections::connection::SharedApplication;
use m2_connections::http::EchoHandler;
use m2_connections::lifecycle::{signals, startup, Shutdown};
use m2_connections::observability::logging;
use m2_connections::routing::Router;
use m2_connections::transport;

#[derive(Parser)]
#[command(name = "m2-connections")]
#[command(about = "Echo server behind a ZeroMQ proxy or a local HTTP gateway", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve the HTTP gateway instead of connecting to the proxy.
    #[arg(long)]
    gateway: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    logging::init(&config.observability.log_level);

    let backend = transport::select_backend(&config.runtime.backend)?;
    tracing::info!(backend = %backend, "m2-connections v0.1.0 starting");

    let binding = if cli.gateway {
        startup::Binding::Gateway
    } else {
        startup::Binding::Socket
    };

    let runtime = backend.build_runtime()?;
    runtime.block_on(async move {
        let application: SharedApplication = Arc::new(Router::new().prefix("/echo", EchoHandler));
        let shutdown = Shutdown::new();
        signals::trigger_on_interrupt(shutdown.clone());

        startup::serve(&config, binding, application, &shutdown).await
    })?;

    tracing::info!("Shutdown complete");
    Ok(())
}
