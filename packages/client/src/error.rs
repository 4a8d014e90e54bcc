//! Error types for the Hiroba client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered the upgrade with an HTTP error
    #[error("Server rejected the connection ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// Could not reach the server
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection dropped
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Failed to reconnect after {0} attempts")]
    RetriesExhausted(u32),
}

impl ClientError {
    /// `false` when retrying with the same parameters cannot succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => *status >= 500,
            Self::ConnectionError(_) | Self::ConnectionLost(_) => true,
            Self::RetriesExhausted(_) => false,
        }
    }
}
