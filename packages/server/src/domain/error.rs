//! Domain error types.

use thiserror::Error;

/// Errors raised when constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} contains invalid characters")]
    InvalidCharacters(&'static str),
}

/// Errors surfaced by the hub to its callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The broker task is gone (shut down or crashed)
    #[error("hub channel closed")]
    ChannelClosed,

    #[error("connection limit of {0} reached")]
    ConnectionLimitReached(usize),

    #[error("room limit of {0} reached")]
    RoomLimitReached(usize),

    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),
}
