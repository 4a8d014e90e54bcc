//! Hub and connection settings.

use std::time::Duration;

use thiserror::Error;

use crate::domain::DEFAULT_BACKLOG_CAPACITY;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// 9/10 of the idle timeout, so a ping always lands before the peer's deadline.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(54);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;
pub const DEFAULT_RECONNECT_GRACE: Duration = Duration::from_secs(30);
pub const DEFAULT_COMMAND_BUFFER: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("ping interval ({ping:?}) must be shorter than the idle timeout ({idle:?})")]
    PingNotBelowIdle { ping: Duration, idle: Duration },

    #[error("backlog capacity ({backlog}) must not exceed the queue capacity ({queue})")]
    BacklogExceedsQueue { backlog: usize, queue: usize },
}

/// Settings for the broker and for every connection's pumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Outbound queue slots per connection
    pub queue_capacity: usize,
    /// Undelivered payloads kept per connection while detached
    pub backlog_capacity: usize,
    pub ping_interval: Duration,
    /// Read deadline, reset by any inbound frame
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    /// Largest inbound message accepted, in bytes
    pub max_message_size: usize,
    /// How long a lost connection keeps its identity, rooms and backlog.
    /// Zero purges immediately.
    pub reconnect_grace: Duration,
    /// Pending requests the broker channel holds before senders wait
    pub command_buffer: usize,
    pub max_connections: Option<usize>,
    pub max_rooms: Option<usize>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            backlog_capacity: DEFAULT_BACKLOG_CAPACITY,
            ping_interval: DEFAULT_PING_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            reconnect_grace: DEFAULT_RECONNECT_GRACE,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            max_connections: None,
            max_rooms: None,
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("queue capacity", self.queue_capacity),
            ("backlog capacity", self.backlog_capacity),
            ("max message size", self.max_message_size),
            ("command buffer", self.command_buffer),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Zero(field));
            }
        }
        if self.max_connections == Some(0) {
            return Err(ConfigError::Zero("max connections"));
        }
        if self.max_rooms == Some(0) {
            return Err(ConfigError::Zero("max rooms"));
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Zero("write timeout"));
        }
        if self.ping_interval.is_zero() {
            return Err(ConfigError::Zero("ping interval"));
        }
        if self.ping_interval >= self.idle_timeout {
            return Err(ConfigError::PingNotBelowIdle {
                ping: self.ping_interval,
                idle: self.idle_timeout,
            });
        }
        // A full backlog must fit into a fresh queue on replay.
        if self.backlog_capacity > self.queue_capacity {
            return Err(ConfigError::BacklogExceedsQueue {
                backlog: self.backlog_capacity,
                queue: self.queue_capacity,
            });
        }
        Ok(())
    }

    pub fn pump_settings(&self) -> PumpSettings {
        PumpSettings {
            queue_capacity: self.queue_capacity,
            ping_interval: self.ping_interval,
            idle_timeout: self.idle_timeout,
            write_timeout: self.write_timeout,
            max_message_size: self.max_message_size,
        }
    }
}

/// The subset of [`HubConfig`] each connection's pumps need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSettings {
    pub queue_capacity: usize,
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub max_message_size: usize,
}

impl Default for PumpSettings {
    fn default() -> Self {
        HubConfig::default().pump_settings()
    }
}
