//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::{HubStateDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

/// Debug endpoint exposing the whole hub state
pub async fn debug_hub_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HubStateDto>, StatusCode> {
    match state.get_hub_state_usecase.execute().await {
        Ok(snapshot) => Ok(Json(HubStateDto::from(&snapshot))),
        Err(e) => {
            tracing::error!("Failed to get hub state: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    match state.get_rooms_usecase.execute().await {
        // Domain Model から DTO への変換
        Ok(rooms) => Ok(Json(rooms.iter().map(RoomSummaryDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to get rooms: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(room_name).await {
        Ok(detail) => Ok(Json(RoomDetailDto::from(&detail))),
        Err(GetRoomDetailError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(GetRoomDetailError::HubUnavailable) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
