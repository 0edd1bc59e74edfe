//! Connection subsystem.
//!
//! # Data Flow
//! ```text
//! Socket binding:
//!     PULL socket → receive loop → spawn task per message
//!         → process_message (parse → route → handler)
//!         → Outbox → publisher task → PUB socket → proxy
//!
//! Gateway binding:
//!     HTTP listener → process_message inline
//!         → respond(status line, headers) + one body element
//! ```
//!
//! # Design Decisions
//! - One `Connection` contract, two bindings
//! - A handler returning `Ok(None)` means "send nothing" (long poll)
//! - A failure inside one dispatched message never reaches the receive loop

pub mod envelope;
pub mod gateway;
pub mod outbox;
pub mod socket;
pub mod tracker;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::http::{CodecError, HttpResponse, ParseError, Request};

pub use gateway::GatewayConnection;
pub use socket::SocketConnection;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Bytes sent verbatim (encoded frames, pre-rendered responses).
    Raw(Bytes),
    /// A structured HTTP response.
    Http(HttpResponse),
}

impl Reply {
    /// Bytes to place in a reply envelope.
    pub fn into_payload(self) -> Bytes {
        match self {
            Reply::Raw(bytes) => bytes,
            Reply::Http(response) => response.render(),
        }
    }
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Reply::Http(response)
    }
}

impl From<Bytes> for Reply {
    fn from(bytes: Bytes) -> Self {
        Reply::Raw(bytes)
    }
}

impl From<&'static str> for Reply {
    fn from(s: &'static str) -> Self {
        Reply::Raw(Bytes::from_static(s.as_bytes()))
    }
}

/// A handler failure.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Result of a handler; `Ok(None)` is the no-reply sentinel.
pub type HandlerResult = Result<Option<Reply>, HandlerError>;

/// Produces the reply for one request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult>;
}

/// Handler built from an async closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(request))
    }
}

/// Maps a parsed request to the handler that serves it.
pub trait Application: Send + Sync + 'static {
    fn route_message(&self, request: &Request) -> Option<Arc<dyn Handler>>;
}

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("zeromq error: {0}")]
    Zmq(#[from] zmq::Error),

    #[error("socket error: {0}")]
    Socket(#[from] tmq::TmqError),

    /// The publisher task has stopped.
    #[error("outbound channel closed")]
    OutboxClosed,
}

/// Failure while handling one message. Logged and dropped; never fatal.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed message: {0}")]
    Parse(#[from] ParseError),

    #[error("no handler for path '{0}'")]
    NoRoute(String),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),

    #[error("reply not sent: {0}")]
    Transport(#[from] TransportError),
}

impl DispatchError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::Parse(_) => "parse",
            DispatchError::NoRoute(_) => "no_route",
            DispatchError::Handler(_) => "handler",
            DispatchError::Transport(_) => "transport",
        }
    }
}

/// Failure that ends a receive loop.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("inbound transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("listener failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application handle.
pub type SharedApplication = Arc<dyn Application>;

/// A way of receiving requests and answering them.
pub trait Connection: Send + Sized + 'static {
    /// What one inbound unit of work looks like on this transport.
    type Message: Send + 'static;
    /// What processing one message yields.
    type Output: Send + 'static;

    /// Parse, route and handle one message.
    fn process_message<'a>(
        &'a self,
        application: &'a dyn Application,
        message: Self::Message,
    ) -> BoxFuture<'a, Self::Output>;

    /// Receive until `shutdown` fires, then return `Ok(())`.
    fn run(
        self,
        application: SharedApplication,
        shutdown: broadcast::Receiver<()>,
    ) -> BoxFuture<'static, Result<(), ConnectionError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handler_fn_wraps_closures() {
        let handler = handler_fn(|req: Request| async move { Ok(Some(Reply::Raw(req.body))) });
        let request = Request {
            body: Bytes::from_static(b"ping"),
            ..Default::default()
        };
        let reply = handler.call(request).await.unwrap();
        assert_eq!(reply, Some(Reply::Raw(Bytes::from_static(b"ping"))));
    }

    #[test]
    fn http_reply_payload_is_rendered() {
        let payload = Reply::from(HttpResponse::ok("x")).into_payload();
        assert!(payload.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(payload.ends_with(b"\r\n\r\nx"));
    }

    #[test]
    fn dispatch_reasons() {
        assert_eq!(DispatchError::NoRoute("/".into()).reason(), "no_route");
        assert_eq!(
            DispatchError::from(ParseError::MissingField("sender")).reason(),
            "parse"
        );
        assert_eq!(DispatchError::from(HandlerError::msg("boom")).reason(), "handler");
    }
}
