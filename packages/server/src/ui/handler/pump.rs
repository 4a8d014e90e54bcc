//! Per-connection read and write loops.
//!
//! Both loops are generic over the socket halves so they can be driven by
//! in-memory streams and sinks in tests.

use std::time::Duration;

use axum::{body::Bytes, extract::ws::Message};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use hiroba_shared::protocol::{FRAME_SEPARATOR, Reply};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    time::{Instant, MissedTickBehavior},
};

use crate::{
    domain::{ConnectionId, OutboundReceiver, WeakOutboundSender},
    usecase::DispatchFrameUseCase,
};

/// Why the read loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The peer sent a Close frame
    PeerClosed,
    TransportError,
    /// The stream ended without a Close frame
    StreamEnded,
    /// Nothing arrived within the idle timeout
    IdleTimeout,
    /// The hub stopped serving requests
    HubClosed,
}

impl ReadOutcome {
    /// `true` when the peer may come back and resume its identity.
    pub fn is_loss(self) -> bool {
        matches!(
            self,
            Self::TransportError | Self::StreamEnded | Self::IdleTimeout
        )
    }
}

/// Why the write loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The hub dropped the queue: purged, replaced by a reconnect or shut down
    QueueClosed,
    /// Stopped by the read loop; carries what was still queued
    Stopped { undelivered: Vec<String> },
    /// A write failed or timed out; carries the failed batch and the rest of
    /// the queue, in order
    Failed { undelivered: Vec<String> },
}

impl WriteOutcome {
    pub fn into_undelivered(self) -> Vec<String> {
        match self {
            Self::QueueClosed => Vec::new(),
            Self::Stopped { undelivered } | Self::Failed { undelivered } => undelivered,
        }
    }
}

/// Read frames until the peer leaves, the transport breaks, the idle
/// deadline passes or the hub goes away.
///
/// Confirmation replies go into the connection's own queue through a weak
/// handle, so the queue still closes when the hub drops it.
pub async fn read_pump<S>(
    mut stream: S,
    id: &ConnectionId,
    dispatcher: &DispatchFrameUseCase,
    replies: &WeakOutboundSender,
    idle_timeout: Duration,
) -> ReadOutcome
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let message = match tokio::time::timeout(idle_timeout, stream.next()).await {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => {
                tracing::warn!("WebSocket error on '{}': {}", id, e);
                return ReadOutcome::TransportError;
            }
            Ok(None) => return ReadOutcome::StreamEnded,
            Err(_) => {
                tracing::info!("Connection '{}' idle for {:?}", id, idle_timeout);
                return ReadOutcome::IdleTimeout;
            }
        };

        let text = match &message {
            Message::Text(text) => text.as_str(),
            Message::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    tracing::warn!("Dropping non UTF-8 binary frame from '{}'", id);
                    continue;
                }
            },
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", id);
                return ReadOutcome::PeerClosed;
            }
        };

        match dispatcher.execute(id, text).await {
            Ok(Some(reply)) => push_reply(id, replies, reply),
            Ok(None) => {}
            Err(e) if e.is_fatal() => {
                tracing::warn!("Hub unavailable, closing '{}'", id);
                return ReadOutcome::HubClosed;
            }
            Err(e) => tracing::warn!("Dropping frame from '{}': {}", id, e),
        }
    }
}

fn push_reply(id: &ConnectionId, replies: &WeakOutboundSender, reply: Reply) {
    let Some(tx) = replies.upgrade() else {
        tracing::debug!("Queue of '{}' already closed, reply dropped", id);
        return;
    };
    match tx.try_send(reply.encode()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Outbound queue of '{}' is full, reply dropped", id)
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!("Queue of '{}' already closed, reply dropped", id)
        }
    }
}

/// Drain the outbound queue into the socket and keep the peer alive with
/// pings.
///
/// Everything already queued when a payload is picked up goes out in the
/// same text frame, joined by [`FRAME_SEPARATOR`].
pub async fn write_pump<K>(
    mut sink: K,
    mut rx: OutboundReceiver,
    mut stop: oneshot::Receiver<()>,
    ping_interval: Duration,
    write_timeout: Duration,
) -> WriteOutcome
where
    K: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => {
                return WriteOutcome::Stopped { undelivered: drain(&mut rx).await };
            }
            next = rx.recv() => {
                let Some(first) = next else {
                    close(&mut sink, write_timeout).await;
                    return WriteOutcome::QueueClosed;
                };
                let mut batch = vec![first];
                while let Ok(payload) = rx.try_recv() {
                    batch.push(payload);
                }
                let frame = batch.join(&FRAME_SEPARATOR.to_string());
                if let Err(e) = send(&mut sink, Message::Text(frame.into()), write_timeout).await {
                    tracing::warn!("Failed to write {} message(s): {}", batch.len(), e);
                    batch.extend(drain(&mut rx).await);
                    return WriteOutcome::Failed { undelivered: batch };
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = send(&mut sink, Message::Ping(Bytes::new()), write_timeout).await {
                    tracing::warn!("Failed to send ping: {}", e);
                    return WriteOutcome::Failed { undelivered: drain(&mut rx).await };
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("{0}")]
    Transport(#[from] axum::Error),

    #[error("write timed out after {0:?}")]
    Timeout(Duration),
}

async fn send<K>(sink: &mut K, message: Message, write_timeout: Duration) -> Result<(), SendError>
where
    K: Sink<Message, Error = axum::Error> + Unpin,
{
    tokio::time::timeout(write_timeout, sink.send(message))
        .await
        .map_err(|_| SendError::Timeout(write_timeout))??;
    Ok(())
}

async fn close<K>(sink: &mut K, write_timeout: Duration)
where
    K: Sink<Message, Error = axum::Error> + Unpin,
{
    if let Err(e) = send(sink, Message::Close(None), write_timeout).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

/// Close the queue and collect what is still in it.
///
/// Once closed, the hub's `try_send` fails with `Closed` and keeps the payload
/// in the backlog, so nothing accepted into the queue is lost.
async fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
    rx.close();
    let mut pending = Vec::new();
    while let Some(payload) = rx.recv().await {
        pending.push(payload);
    }
    pending
}
