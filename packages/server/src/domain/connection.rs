//! Connection entity: one peer's outbound queue plus its backlog.

use std::collections::VecDeque;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{Backlog, ConnectionId, DisplayName, Generation, Timestamp};

/// Producer side of a connection's outbound queue
pub type OutboundSender = mpsc::Sender<String>;
/// Consumer side, drained by the write loop only
pub type OutboundReceiver = mpsc::Receiver<String>;
/// Handle that does not keep the outbound queue open
pub type WeakOutboundSender = mpsc::WeakSender<String>;

/// Whether a transport is currently attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Live,
    Detached,
}

#[derive(Debug)]
enum Link {
    Live(OutboundSender),
    Detached { since: Timestamp },
}

/// Outcome of handing one payload to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the outbound queue
    Queued,
    /// Queue full; the payload was dropped for this connection
    DroppedFull,
    /// Transport gone; the payload was kept for replay
    Backlogged { evicted: bool },
}

/// A registered peer as seen by the broker.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    name: DisplayName,
    generation: Generation,
    link: Link,
    backlog: Backlog,
    connected_at: Timestamp,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        name: DisplayName,
        generation: Generation,
        outbound: OutboundSender,
        backlog_capacity: usize,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            generation,
            link: Link::Live(outbound),
            backlog: Backlog::new(backlog_capacity),
            connected_at,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn state(&self) -> LinkState {
        match self.link {
            Link::Live(_) => LinkState::Live,
            Link::Detached { .. } => LinkState::Detached,
        }
    }

    /// When the transport was lost, if it is.
    pub fn detached_since(&self) -> Option<Timestamp> {
        match self.link {
            Link::Live(_) => None,
            Link::Detached { since } => Some(since),
        }
    }

    /// Hand a payload over without ever blocking.
    ///
    /// A full queue drops the payload; a closed queue or a detached link
    /// keeps it in the backlog.
    pub fn deliver(&mut self, payload: String) -> Delivery {
        match &self.link {
            Link::Live(outbound) => match outbound.try_send(payload) {
                Ok(()) => Delivery::Queued,
                Err(TrySendError::Full(_)) => Delivery::DroppedFull,
                Err(TrySendError::Closed(payload)) => Delivery::Backlogged {
                    evicted: self.backlog.push(payload),
                },
            },
            Link::Detached { .. } => Delivery::Backlogged {
                evicted: self.backlog.push(payload),
            },
        }
    }

    /// Attach a new transport in place of the old one.
    ///
    /// The backlog is replayed into the new queue before anything else can
    /// reach it; whatever does not fit stays in the backlog. The previous
    /// queue is closed by dropping its sender. Returns the replayed count.
    pub fn attach(
        &mut self,
        name: DisplayName,
        outbound: OutboundSender,
        generation: Generation,
    ) -> usize {
        let replayed = self.replay_into(&outbound);
        self.name = name;
        self.generation = generation;
        self.link = Link::Live(outbound);
        replayed
    }

    fn replay_into(&mut self, outbound: &OutboundSender) -> usize {
        if self.backlog.is_empty() {
            return 0;
        }
        let mut pending: VecDeque<String> = self.backlog.take().into();
        let mut replayed = 0;
        while let Some(message) = pending.pop_front() {
            if let Err(err) = outbound.try_send(message) {
                pending.push_front(err.into_inner());
                break;
            }
            replayed += 1;
        }
        if !pending.is_empty() {
            self.backlog.restore_front(pending.into());
        }
        replayed
    }

    /// Drop the transport and keep what it failed to flush.
    ///
    /// Returns the number of payloads evicted from the backlog.
    pub fn detach(&mut self, undelivered: Vec<String>, at: Timestamp) -> usize {
        self.link = Link::Detached { since: at };
        self.backlog.restore_front(undelivered)
    }
}
