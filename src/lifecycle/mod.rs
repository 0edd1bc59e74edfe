//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → metrics exporter → build connection → run receive loop
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger()
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed receive loop returns Ok(())
//! ```
//!
//! # Design Decisions
//! - An interrupt is a normal way to stop, not an error
//! - In-flight handlers are abandoned, not drained

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
