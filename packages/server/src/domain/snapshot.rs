//! Read-only copies of hub state, for inspection endpoints.

use super::{ConnectionId, DisplayName, LinkState, RoomName, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub state: LinkState,
    pub connected_at: Timestamp,
    /// Set while the connection waits for a reconnect
    pub detached_since: Option<Timestamp>,
    pub backlog_len: usize,
    /// Sorted by name
    pub rooms: Vec<RoomName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    /// Sorted by id
    pub members: Vec<ConnectionId>,
}

/// A room together with its members' connection details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub name: RoomName,
    /// Sorted by id
    pub members: Vec<ConnectionSnapshot>,
}

/// Connections sorted by id, rooms sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HubSnapshot {
    pub connections: Vec<ConnectionSnapshot>,
    pub rooms: Vec<RoomSnapshot>,
}

impl HubSnapshot {
    pub fn connection(&self, id: &ConnectionId) -> Option<&ConnectionSnapshot> {
        self.connections.iter().find(|connection| &connection.id == id)
    }

    pub fn room(&self, name: &str) -> Option<&RoomSnapshot> {
        self.rooms.iter().find(|room| room.name.as_str() == name)
    }

    /// Resolve a room's members against the connection table.
    pub fn room_detail(&self, name: &str) -> Option<RoomDetail> {
        let room = self.room(name)?;
        Some(RoomDetail {
            name: room.name.clone(),
            members: room
                .members
                .iter()
                .filter_map(|id| self.connection(id))
                .cloned()
                .collect(),
        })
    }
}
