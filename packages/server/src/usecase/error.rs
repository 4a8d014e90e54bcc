//! UseCase 層のエラー型

use hiroba_shared::protocol::ProtocolError;
use thiserror::Error;

use crate::domain::{HubError, ValueObjectError};

/// Errors raised before or while registering a peer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("invalid client id: {0}")]
    InvalidClientId(ValueObjectError),

    #[error("invalid display name: {0}")]
    InvalidDisplayName(ValueObjectError),

    #[error("connection limit of {0} reached")]
    ConnectionLimitReached(usize),

    #[error("hub is not running")]
    HubUnavailable,
}

impl From<HubError> for ConnectError {
    fn from(error: HubError) -> Self {
        match error {
            HubError::ConnectionLimitReached(max) => Self::ConnectionLimitReached(max),
            _ => Self::HubUnavailable,
        }
    }
}

/// Errors raised while handling one inbound frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("malformed frame: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid value: {0}")]
    InvalidValue(#[from] ValueObjectError),

    #[error("request rejected: {0}")]
    Rejected(HubError),

    #[error("hub is not running")]
    HubUnavailable,
}

impl DispatchError {
    /// `true` when the connection cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HubUnavailable)
    }
}

impl From<HubError> for DispatchError {
    fn from(error: HubError) -> Self {
        match error {
            HubError::ChannelClosed => Self::HubUnavailable,
            other => Self::Rejected(other),
        }
    }
}

/// The hub could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("hub is not running")]
    HubUnavailable,
}

impl From<HubError> for ServiceError {
    fn from(_: HubError) -> Self {
        Self::HubUnavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("hub is not running")]
    HubUnavailable,
}

impl From<ServiceError> for GetRoomDetailError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::HubUnavailable => Self::HubUnavailable,
        }
    }
}
