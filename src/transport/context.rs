//! Process-wide ZeroMQ context.

use std::sync::OnceLock;

static CONTEXT: OnceLock<zmq::Context> = OnceLock::new();

/// The shared ZeroMQ context, created on first call and reused for the life of the process.
pub fn shared_context() -> &'static zmq::Context {
    CONTEXT.get_or_init(|| {
        tracing::debug!("Creating shared ZeroMQ context");
        zmq::Context::new()
    })
}
