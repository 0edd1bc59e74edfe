//! Shared utilities for integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use futures_util::stream;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use m2_connections::connection::outbox::Outbox;
use m2_connections::connection::socket::{Identity, Inbound};
use m2_connections::connection::{SocketConnection, TransportError};
use m2_connections::transport::TokioSpawner;

/// Build a raw proxy message.
pub fn proxy_msg(sender: &str, conn_id: &str, path: &str, headers: &str, body: &[u8]) -> Bytes {
    let mut raw = format!(
        "{} {} {} {}:{},{}:",
        sender,
        conn_id,
        path,
        headers.len(),
        headers,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    raw.push(b',');
    Bytes::from(raw)
}

/// Disconnect notification for `conn_id`.
pub fn disconnect_msg(sender: &str, conn_id: &str) -> Bytes {
    proxy_msg(sender, conn_id, "@*", r#"{"METHOD":"JSON"}"#, br#"{"type":"disconnect"}"#)
}

/// A socket connection wired to in-memory channels instead of ZeroMQ sockets.
pub struct Harness {
    pub connection: SocketConnection,
    pub inbound: mpsc::UnboundedSender<Result<Bytes, TransportError>>,
    pub outbound: mpsc::Receiver<Bytes>,
}

pub fn harness() -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let inbound: Inbound = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();
    let (outbox, outbound) = Outbox::channel(64);
    let spawner = Arc::new(TokioSpawner::current().expect("tests run inside a runtime"));
    let connection = SocketConnection::from_parts(Identity::from("test-identity"), inbound, outbox, spawner);
    Harness {
        connection,
        inbound: tx,
        outbound,
    }
}

/// Wait briefly for the next envelope.
pub async fn next_envelope(rx: &mut mpsc::Receiver<Bytes>) -> Option<Bytes> {
    tokio::time::timeout(Duration::from_millis(500), rx.recv())
        .await
        .ok()
        .flatten()
}
