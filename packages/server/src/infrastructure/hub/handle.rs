//! Cloneable handle forwarding requests to the broker task.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{
    ConnectionId, DisplayName, Generation, HubError, HubSnapshot, MessageBroker, OutboundSender,
    RoomName,
};

use super::command::{HubCommand, Responder};

/// Sending half of the broker's request channel.
///
/// This is the only way into the hub: it carries requests, never state.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(super) fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| HubError::ChannelClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> HubCommand,
    ) -> Result<T, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| HubError::ChannelClosed)
    }

    /// `true` once the broker task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl MessageBroker for HubHandle {
    async fn admit(&self, requested: Option<ConnectionId>) -> Result<ConnectionId, HubError> {
        self.request(move |reply| HubCommand::Admit { requested, reply })
            .await?
    }

    async fn register(
        &self,
        id: ConnectionId,
        name: DisplayName,
        outbound: OutboundSender,
    ) -> Result<Generation, HubError> {
        self.request(move |reply| HubCommand::Register {
            id,
            name,
            outbound,
            reply,
        })
        .await?
    }

    async fn unregister(&self, id: ConnectionId, generation: Generation) -> Result<(), HubError> {
        self.send(HubCommand::Unregister { id, generation }).await
    }

    async fn detach(
        &self,
        id: ConnectionId,
        generation: Generation,
        undelivered: Vec<String>,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Detach {
            id,
            generation,
            undelivered,
        })
        .await
    }

    async fn broadcast(&self, payload: String) -> Result<(), HubError> {
        self.send(HubCommand::Broadcast { payload }).await
    }

    async fn join_room(&self, id: ConnectionId, room: RoomName) -> Result<(), HubError> {
        self.request(move |reply| HubCommand::JoinRoom { id, room, reply })
            .await?
    }

    async fn leave_room(&self, id: ConnectionId, room: RoomName) -> Result<(), HubError> {
        self.request(move |reply| HubCommand::LeaveRoom { id, room, reply })
            .await
    }

    async fn send_to_room(
        &self,
        room: RoomName,
        payload: String,
        sender: Option<ConnectionId>,
    ) -> Result<(), HubError> {
        self.send(HubCommand::SendToRoom {
            room,
            payload,
            sender,
        })
        .await
    }

    async fn send_to_name(&self, name: DisplayName, payload: String) -> Result<(), HubError> {
        self.send(HubCommand::SendToName { name, payload }).await
    }

    async fn snapshot(&self) -> Result<HubSnapshot, HubError> {
        self.request(|reply| HubCommand::Snapshot { reply }).await
    }

    async fn shutdown(&self) -> Result<(), HubError> {
        self.request(|reply| HubCommand::Shutdown { reply }).await
    }
}
