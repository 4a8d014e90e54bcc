//! Bounded queue of payloads a detached peer missed.

use std::collections::VecDeque;

/// Default number of payloads retained per connection.
pub const DEFAULT_BACKLOG_CAPACITY: usize = 100;

/// Oldest-first eviction FIFO of undelivered payloads.
#[derive(Debug, Clone)]
pub struct Backlog {
    messages: VecDeque<String>,
    capacity: usize,
}

impl Backlog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(DEFAULT_BACKLOG_CAPACITY)),
            capacity,
        }
    }

    /// Append a payload; returns `true` when the oldest one was evicted.
    pub fn push(&mut self, message: String) -> bool {
        if self.capacity == 0 {
            return true;
        }
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front();
            true
        } else {
            false
        };
        self.messages.push_back(message);
        evicted
    }

    /// Put payloads in front of everything already held, keeping their order.
    ///
    /// Used for payloads a write loop failed to flush: they were queued before
    /// anything that reached the backlog through a closed queue. Returns the
    /// number of payloads evicted to stay within capacity.
    pub fn restore_front(&mut self, messages: Vec<String>) -> usize {
        for message in messages.into_iter().rev() {
            self.messages.push_front(message);
        }
        let overflow = self.messages.len().saturating_sub(self.capacity);
        self.messages.drain(..overflow);
        overflow
    }

    /// Take every payload out, oldest first, leaving the backlog empty.
    pub fn take(&mut self) -> Vec<String> {
        self.messages.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Backlog {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLOG_CAPACITY)
    }
}
