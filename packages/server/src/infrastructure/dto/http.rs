//! HTTP API response DTOs.

use serde::Serialize;

use crate::domain::{ConnectionSnapshot, HubSnapshot, LinkState, RoomDetail, RoomSnapshot};
use hiroba_shared::time::timestamp_to_jst_rfc3339;

/// Entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummaryDto {
    pub name: String,
    /// Connection ids, sorted
    pub members: Vec<String>,
}

/// Member entry of `GET /api/rooms/{room_name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDetailDto {
    pub connection_id: String,
    pub display_name: String,
    /// RFC 3339 (JST)
    pub connected_at: String,
}

/// Response of `GET /api/rooms/{room_name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomDetailDto {
    pub name: String,
    pub members: Vec<MemberDetailDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStateDto {
    Live,
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStateDto {
    pub connection_id: String,
    pub display_name: String,
    pub state: LinkStateDto,
    pub connected_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detached_at: Option<String>,
    pub backlog_len: usize,
    pub rooms: Vec<String>,
}

/// Response of `GET /debug/hub`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStateDto {
    pub connections: Vec<ConnectionStateDto>,
    pub rooms: Vec<RoomSummaryDto>,
}

// ========================================
// Domain → DTO
// ========================================

impl From<LinkState> for LinkStateDto {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Live => Self::Live,
            LinkState::Detached => Self::Detached,
        }
    }
}

impl From<&RoomSnapshot> for RoomSummaryDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            name: room.name.as_str().to_string(),
            members: room
                .members
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
        }
    }
}

impl From<&ConnectionSnapshot> for MemberDetailDto {
    fn from(connection: &ConnectionSnapshot) -> Self {
        Self {
            connection_id: connection.id.as_str().to_string(),
            display_name: connection.name.as_str().to_string(),
            connected_at: timestamp_to_jst_rfc3339(connection.connected_at.value()),
        }
    }
}

impl From<&ConnectionSnapshot> for ConnectionStateDto {
    fn from(connection: &ConnectionSnapshot) -> Self {
        Self {
            connection_id: connection.id.as_str().to_string(),
            display_name: connection.name.as_str().to_string(),
            state: connection.state.into(),
            connected_at: timestamp_to_jst_rfc3339(connection.connected_at.value()),
            detached_at: connection
                .detached_since
                .map(|since| timestamp_to_jst_rfc3339(since.value())),
            backlog_len: connection.backlog_len,
            rooms: connection
                .rooms
                .iter()
                .map(|room| room.as_str().to_string())
                .collect(),
        }
    }
}

impl From<&RoomDetail> for RoomDetailDto {
    fn from(detail: &RoomDetail) -> Self {
        Self {
            name: detail.name.as_str().to_string(),
            members: detail.members.iter().map(MemberDetailDto::from).collect(),
        }
    }
}

impl From<&HubSnapshot> for HubStateDto {
    fn from(snapshot: &HubSnapshot) -> Self {
        Self {
            connections: snapshot
                .connections
                .iter()
                .map(ConnectionStateDto::from)
                .collect(),
            rooms: snapshot.rooms.iter().map(RoomSummaryDto::from).collect(),
        }
    }
}
