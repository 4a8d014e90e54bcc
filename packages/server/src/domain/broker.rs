//! MessageBroker trait 定義
//!
//! Connection tasks and usecases talk to the hub only through this trait.
//! They hold a handle that forwards requests over a channel and never see the
//! hub's tables. The concrete implementation is
//! `infrastructure::hub::HubHandle`.

use async_trait::async_trait;

use super::{
    ConnectionId, DisplayName, Generation, HubError, HubSnapshot, OutboundSender, RoomName,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Resolve the identity for an incoming peer before upgrade.
    ///
    /// A known `requested` id is returned unchanged (reconnection); anything
    /// else gets a fresh id.
    async fn admit(&self, requested: Option<ConnectionId>) -> Result<ConnectionId, HubError>;

    /// Register a transport; replaces the existing entry with the same id in
    /// place and replays its backlog. Resolves once applied.
    ///
    /// A new id fails with [`HubError::ConnectionLimitReached`] when the
    /// ceiling was reached since admission.
    async fn register(
        &self,
        id: ConnectionId,
        name: DisplayName,
        outbound: OutboundSender,
    ) -> Result<Generation, HubError>;

    /// Purge a connection. No-op for an unknown id or a stale generation.
    async fn unregister(&self, id: ConnectionId, generation: Generation) -> Result<(), HubError>;

    /// Report a lost transport along with the payloads it could not flush.
    async fn detach(
        &self,
        id: ConnectionId,
        generation: Generation,
        undelivered: Vec<String>,
    ) -> Result<(), HubError>;

    async fn broadcast(&self, payload: String) -> Result<(), HubError>;

    /// Resolves once the membership change is applied.
    async fn join_room(&self, id: ConnectionId, room: RoomName) -> Result<(), HubError>;

    /// Resolves once the membership change is applied.
    async fn leave_room(&self, id: ConnectionId, room: RoomName) -> Result<(), HubError>;

    /// Deliver to every member of `room` except `sender`.
    async fn send_to_room(
        &self,
        room: RoomName,
        payload: String,
        sender: Option<ConnectionId>,
    ) -> Result<(), HubError>;

    /// Deliver to every connection whose display name is `name`.
    async fn send_to_name(&self, name: DisplayName, payload: String) -> Result<(), HubError>;

    async fn snapshot(&self) -> Result<HubSnapshot, HubError>;

    /// Close every connection and stop the broker.
    async fn shutdown(&self) -> Result<(), HubError>;
}
