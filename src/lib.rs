//! Transport and connection layer for a message-driven web framework.
//!
//! Requests arrive either from a ZeroMQ reverse proxy (PULL in, PUB out) or from a local
//! HTTP gateway, are normalized into one [`http::Request`], routed to a handler by an
//! [`connection::Application`], and answered over the transport they came from.

// Core subsystems
pub mod connection;
pub mod http;
pub mod routing;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use connection::{Application, Connection, GatewayConnection, Handler, Reply, SocketConnection};
pub use lifecycle::Shutdown;
