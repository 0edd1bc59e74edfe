//! Transport binding subsystem.
//!
//! # Data Flow
//! ```text
//! [runtime] backend = "current_thread" | "multi_thread"
//!     → select_backend() (resolved once per process)
//!     → Backend::build_runtime() (tokio runtime for the whole process)
//!
//! SocketConnection::connect()
//!     → shared_context() (one zmq::Context, created on first use)
//!     → PULL / PUB sockets
//!
//! Receive loop
//!     → Spawner (injected, one task per inbound message)
//! ```
//!
//! # Design Decisions
//! - The ZeroMQ context is expensive and shared by every connection
//! - Backend choice is made once; later selections cannot change it
//! - Task spawning is a capability handed to connections, not ambient state

pub mod context;
pub mod spawner;

use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

pub use context::shared_context;
pub use spawner::{Spawner, TokioSpawner};

/// Errors raised while resolving the transport backend.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configured backend name is not one we know how to run.
    #[error("unknown runtime backend '{0}' (expected 'current_thread' or 'multi_thread')")]
    UnknownBackend(String),

    /// A backend was requested before one was selected.
    #[error("no runtime backend has been selected for this process")]
    NoBackend,

    /// A spawner was requested outside of a running runtime.
    #[error("no async runtime is active on this thread")]
    NoRuntime,

    /// The runtime could not be built.
    #[error("failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Cooperative scheduling backend for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Single-threaded cooperative scheduling.
    #[default]
    CurrentThread,
    /// Work-stealing scheduler across worker threads.
    MultiThread,
}

impl Backend {
    /// Configuration name of this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::CurrentThread => "current_thread",
            Backend::MultiThread => "multi_thread",
        }
    }

    /// Build the tokio runtime that drives every connection in the process.
    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime, ConfigurationError> {
        let mut builder = match self {
            Backend::CurrentThread => tokio::runtime::Builder::new_current_thread(),
            Backend::MultiThread => tokio::runtime::Builder::new_multi_thread(),
        };
        Ok(builder.enable_all().build()?)
    }
}

impl FromStr for Backend {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current_thread" => Ok(Backend::CurrentThread),
            "multi_thread" => Ok(Backend::MultiThread),
            other => Err(ConfigurationError::UnknownBackend(other.to_string())),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static SELECTED_BACKEND: OnceLock<Backend> = OnceLock::new();

/// Resolve and record the process-wide backend.
///
/// The first successful selection wins; later calls return the backend already in effect.
pub fn select_backend(name: &str) -> Result<Backend, ConfigurationError> {
    let requested: Backend = name.parse()?;
    let selected = *SELECTED_BACKEND.get_or_init(|| requested);
    if selected != requested {
        tracing::warn!(
            requested = %requested,
            selected = %selected,
            "Runtime backend already selected, ignoring new selection"
        );
    }
    Ok(selected)
}

/// The backend in effect for this process.
pub fn library() -> Result<Backend, ConfigurationError> {
    SELECTED_BACKEND.get().copied().ok_or(ConfigurationError::NoBackend)
}
