//! Outbound reply channel.
//!
//! # Responsibilities
//! - Give every dispatched task a cheap handle for writing replies
//! - Serialize writes onto the single PUB socket
//!
//! # Design Decisions
//! - One publisher task owns the socket; each envelope is one ZeroMQ message,
//!   so concurrent replies never interleave
//! - Bounded channel: a slow proxy applies backpressure to handlers, not memory

use bytes::Bytes;
use futures_util::SinkExt;
use tmq::publish::Publish;
use tmq::Multipart;
use tokio::sync::mpsc;

use super::TransportError;
use crate::observability::metrics;

/// Handle for queueing envelopes onto the outbound socket.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Bytes>,
}

impl Outbox {
    /// Create an outbox and the receiving end a publisher drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue one complete envelope.
    pub async fn post(&self, envelope: Bytes) -> Result<(), TransportError> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| TransportError::OutboxClosed)
    }
}

/// Drain `rx` into the PUB socket until every `Outbox` handle is dropped.
pub async fn publish_loop(mut rx: mpsc::Receiver<Bytes>, mut socket: Publish) {
    while let Some(envelope) = rx.recv().await {
        let len = envelope.len();
        match socket.send(Multipart::from(vec![envelope.to_vec()])).await {
            Ok(()) => {
                metrics::record_reply_sent();
                tracing::trace!(bytes = len, "Envelope published");
            }
            Err(e) => {
                tracing::error!(error = %e, bytes = len, "Failed to publish envelope");
            }
        }
    }
    tracing::debug!("Publisher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posts_arrive_in_order() {
        let (outbox, mut rx) = Outbox::channel(4);
        outbox.post(Bytes::from_static(b"a")).await.unwrap();
        outbox.clone().post(Bytes::from_static(b"b")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"a"));
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"b"));
    }

    #[tokio::test]
    async fn closed_receiver_is_reported() {
        let (outbox, rx) = Outbox::channel(1);
        drop(rx);
        assert!(matches!(
            outbox.post(Bytes::from_static(b"a")).await,
            Err(TransportError::OutboxClosed)
        ));
    }
}
