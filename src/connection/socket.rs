//! ZeroMQ socket binding.
//!
//! # Responsibilities
//! - Connect a PULL socket (requests from the proxy) and a PUB socket (replies)
//! - Advertise a per-process identity on the PUB socket
//! - Receive forever, spawning one task per message
//! - Encode replies, broadcasts and close requests as envelopes
//!
//! # Data Flow
//! ```text
//! proxy ──PUSH──▶ PULL ──▶ receive loop ──spawn──▶ process_message
//!                                                      │
//! proxy ◀──SUB─── PUB ◀── publisher task ◀── Outbox ◀──┘
//! ```
//!
//! # Design Decisions
//! - Both sockets connect; the proxy binds
//! - The receive loop never waits on a handler
//! - Spawned tasks are not joined on shutdown

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;
use tmq::publish::Publish;
use tmq::pull::Pull;
use tmq::FromZmqSocket;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::envelope;
use super::outbox::{publish_loop, Outbox};
use super::tracker::InFlight;
use super::{
    Application, Connection, ConnectionError, DispatchError, SharedApplication, TransportError,
};
use crate::config::SocketConfig;
use crate::http::Request;
use crate::observability::metrics;
use crate::transport::{self, Spawner};

/// Stream of raw inbound messages.
pub type Inbound = BoxStream<'static, Result<Bytes, TransportError>>;

/// Routing identity of this process's outbound socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Fresh 128-bit random identity, hex encoded.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A reply envelope was queued.
    Replied,
    /// The handler asked for no reply.
    NoReply,
    /// The proxy reported a client disconnect; nothing was routed.
    Disconnect,
}

/// Writes addressed replies through the proxy.
///
/// Cloneable; handlers that broadcast keep one around.
#[derive(Debug, Clone)]
pub struct Replier {
    outbox: Outbox,
}

impl Replier {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }

    /// Raw send to `conn_id` behind the proxy identified by `identity`.
    pub async fn send(
        &self,
        identity: &str,
        conn_id: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.outbox
            .post(envelope::encode(identity, conn_id, payload))
            .await
    }

    /// Answer `request`.
    pub async fn reply(&self, request: &Request, payload: &[u8]) -> Result<(), TransportError> {
        self.send(&request.sender, &request.conn_id, payload).await
    }

    /// Send one payload to many clients in a single envelope.
    ///
    /// Keep `conn_ids` at or below [`envelope::MAX_IDENTS`]; the proxy drops larger lists.
    pub async fn reply_bulk<S: AsRef<str>>(
        &self,
        identity: &str,
        conn_ids: &[S],
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.send(identity, &envelope::join_idents(conn_ids), payload)
            .await
    }

    /// Ask the proxy to close the client connection behind `request`.
    pub async fn close(&self, request: &Request) -> Result<(), TransportError> {
        self.reply(request, b"").await
    }

    /// Ask the proxy to close several client connections.
    pub async fn close_bulk<S: AsRef<str>>(
        &self,
        identity: &str,
        conn_ids: &[S],
    ) -> Result<(), TransportError> {
        self.reply_bulk(identity, conn_ids, b"").await
    }
}

struct Shared {
    identity: Identity,
    replier: Replier,
    in_flight: InFlight,
}

impl Shared {
    async fn process_message(
        &self,
        application: &dyn Application,
        message: Bytes,
    ) -> Result<Delivery, DispatchError> {
        let request = Request::parse_msg(&message)?;

        if request.is_disconnect() {
            metrics::record_disconnect();
            tracing::debug!(sender = %request.sender, conn_id = %request.conn_id, "Client disconnected");
            return Ok(Delivery::Disconnect);
        }

        let handler = application
            .route_message(&request)
            .ok_or_else(|| DispatchError::NoRoute(request.path.clone()))?;

        let sender = request.sender.clone();
        let conn_id = request.conn_id.clone();
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            conn_id = %conn_id,
            "Dispatching request"
        );

        match handler.call(request).await? {
            Some(reply) => {
                self.replier
                    .send(&sender, &conn_id, &reply.into_payload())
                    .await?;
                Ok(Delivery::Replied)
            }
            None => Ok(Delivery::NoReply),
        }
    }

    async fn dispatch(&self, application: &dyn Application, message: Bytes) {
        let guard = self.in_flight.track();
        match self.process_message(application, message).await {
            Ok(delivery) => {
                tracing::trace!(dispatch_id = %guard.id(), ?delivery, "Message handled");
            }
            Err(e) => {
                metrics::record_dispatch_failure(e.reason());
                tracing::warn!(dispatch_id = %guard.id(), error = %e, "Dropping message");
            }
        }
    }
}

/// Multiplexed connection to a ZeroMQ reverse proxy.
pub struct SocketConnection {
    shared: Arc<Shared>,
    inbound: Inbound,
    spawner: Arc<dyn Spawner>,
}

impl SocketConnection {
    /// Connect to the proxy's pull and publish endpoints.
    ///
    /// Must be called inside the runtime: the sockets register with its reactor and the
    /// publisher task is spawned immediately.
    pub fn connect(config: &SocketConfig, spawner: Arc<dyn Spawner>) -> Result<Self, TransportError> {
        let ctx = transport::shared_context();
        let identity = Identity::generate();

        let pull = ctx.socket(zmq::PULL)?;
        pull.set_linger(0)?;
        pull.connect(&config.pull_address)?;

        let publish = ctx.socket(zmq::PUB)?;
        publish.set_linger(0)?;
        publish.set_identity(identity.as_str().as_bytes())?;
        publish.connect(&config.pub_address)?;

        let pull = Pull::from_zmq_socket(pull)?;
        let publish = Publish::from_zmq_socket(publish)?;

        let (outbox, rx) = Outbox::channel(config.outbox_capacity);
        spawner.spawn(Box::pin(publish_loop(rx, publish)));

        let inbound = pull
            .map(|result| {
                result
                    .map(|multipart| {
                        Bytes::from(
                            multipart
                                .into_iter()
                                .flat_map(|frame| frame.to_vec())
                                .collect::<Vec<u8>>(),
                        )
                    })
                    .map_err(TransportError::from)
            })
            .boxed();

        tracing::info!(
            identity = %identity,
            pull_address = %config.pull_address,
            pub_address = %config.pub_address,
            "Connected to proxy"
        );

        Ok(Self::from_parts(identity, inbound, outbox, spawner))
    }

    /// Assemble a connection from an already-open inbound stream and outbox.
    pub fn from_parts(
        identity: Identity,
        inbound: Inbound,
        outbox: Outbox,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                identity,
                replier: Replier::new(outbox),
                in_flight: InFlight::new(),
            }),
            inbound,
            spawner,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.shared.identity
    }

    /// Handle for sending replies outside of the request path (broadcasts, server push).
    pub fn replier(&self) -> Replier {
        self.shared.replier.clone()
    }

    /// Dispatched messages still being handled.
    pub fn in_flight(&self) -> u64 {
        self.shared.in_flight.active_count()
    }

    pub async fn send(&self, identity: &str, conn_id: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.shared.replier.send(identity, conn_id, payload).await
    }

    pub async fn reply(&self, request: &Request, payload: &[u8]) -> Result<(), TransportError> {
        self.shared.replier.reply(request, payload).await
    }

    pub async fn reply_bulk<S: AsRef<str>>(
        &self,
        identity: &str,
        conn_ids: &[S],
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.shared.replier.reply_bulk(identity, conn_ids, payload).await
    }

    pub async fn close(&self, request: &Request) -> Result<(), TransportError> {
        self.shared.replier.close(request).await
    }

    pub async fn close_bulk<S: AsRef<str>>(&self, identity: &str, conn_ids: &[S]) -> Result<(), TransportError> {
        self.shared.replier.close_bulk(identity, conn_ids).await
    }
}

impl Connection for SocketConnection {
    type Message = Bytes;
    type Output = Result<Delivery, DispatchError>;

    fn process_message<'a>(
        &'a self,
        application: &'a dyn Application,
        message: Bytes,
    ) -> BoxFuture<'a, Self::Output> {
        Box::pin(self.shared.process_message(application, message))
    }

    fn run(
        self,
        application: SharedApplication,
        mut shutdown: broadcast::Receiver<()>,
    ) -> BoxFuture<'static, Result<(), ConnectionError>> {
        Box::pin(async move {
            let SocketConnection {
                shared,
                mut inbound,
                spawner,
            } = self;

            tracing::info!(identity = %shared.identity, "Receive loop starting");

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown signal received, stopping receive loop");
                        break;
                    }

                    next = inbound.next() => match next {
                        Some(Ok(message)) => {
                            metrics::record_message_received();
                            let shared = Arc::clone(&shared);
                            let application = Arc::clone(&application);
                            spawner.spawn(Box::pin(async move {
                                shared.dispatch(application.as_ref(), message).await;
                            }));
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Inbound socket failed");
                            return Err(e.into());
                        }
                        None => {
                            tracing::info!("Inbound stream ended");
                            break;
                        }
                    }
                }
            }

            tracing::info!(
                identity = %shared.identity,
                abandoned = shared.in_flight.active_count(),
                "Receive loop stopped"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_128_bit_hex() {
        let id = Identity::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, Identity::generate());
    }

    #[tokio::test]
    async fn close_sends_empty_payload_to_the_request_origin() {
        let (outbox, mut rx) = Outbox::channel(4);
        let replier = Replier::new(outbox);
        let request = Request {
            sender: "S1".into(),
            conn_id: "42".into(),
            ..Default::default()
        };
        replier.close(&request).await.unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"S1 2:42, ");
    }

    #[tokio::test]
    async fn close_bulk_joins_ids() {
        let (outbox, mut rx) = Outbox::channel(4);
        Replier::new(outbox).close_bulk("S1", &["1", "2"]).await.unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"S1 3:1 2, ");
    }
}
