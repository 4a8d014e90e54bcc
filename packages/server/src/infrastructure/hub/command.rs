//! Requests accepted by the broker task.

use tokio::sync::oneshot;

use crate::domain::{
    ConnectionId, DisplayName, Generation, HubError, HubSnapshot, OutboundSender, RoomName,
};

/// Reply channel paired with a request
pub type Responder<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum HubCommand {
    Admit {
        requested: Option<ConnectionId>,
        reply: Responder<Result<ConnectionId, HubError>>,
    },
    Register {
        id: ConnectionId,
        name: DisplayName,
        outbound: OutboundSender,
        reply: Responder<Result<Generation, HubError>>,
    },
    Unregister {
        id: ConnectionId,
        generation: Generation,
    },
    Detach {
        id: ConnectionId,
        generation: Generation,
        undelivered: Vec<String>,
    },
    /// Grace period of a detached connection elapsed
    Expire {
        id: ConnectionId,
        generation: Generation,
    },
    Broadcast {
        payload: String,
    },
    JoinRoom {
        id: ConnectionId,
        room: RoomName,
        reply: Responder<Result<(), HubError>>,
    },
    LeaveRoom {
        id: ConnectionId,
        room: RoomName,
        reply: Responder<()>,
    },
    SendToRoom {
        room: RoomName,
        payload: String,
        sender: Option<ConnectionId>,
    },
    SendToName {
        name: DisplayName,
        payload: String,
    },
    Snapshot {
        reply: Responder<HubSnapshot>,
    },
    Shutdown {
        reply: Responder<()>,
    },
}
