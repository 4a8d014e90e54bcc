//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::stream::StreamExt;
use hiroba_shared::protocol::CONNECTION_ID_HEADER;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    ui::state::AppState,
    usecase::{Admission, ConnectError, DisconnectReason},
};

use super::pump::{ReadOutcome, WriteOutcome, read_pump, write_pump};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Id handed out on a previous connection, to resume it
    pub client_id: Option<String>,
    pub name: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let admission = match state
        .connect_client_usecase
        .admit(query.client_id, query.name)
        .await
    {
        Ok(admission) => admission,
        Err(e @ (ConnectError::InvalidClientId(_) | ConnectError::InvalidDisplayName(_))) => {
            tracing::warn!("Rejecting connection: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Err(e) => {
            tracing::warn!("Rejecting connection: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };

    let header_value = match HeaderValue::from_str(admission.id.as_str()) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Connection id '{}' is not a valid header: {}", admission.id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let max_message_size = state.pump_settings.max_message_size;
    let mut response = ws
        .max_message_size(max_message_size)
        .on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state, admission));
    response
        .headers_mut()
        .insert(CONNECTION_ID_HEADER, header_value);
    response
}

/// Run one transport of a connection from registration to teardown.
///
/// The read loop runs on this task and the write loop on a spawned one.
/// Whichever ends first decides how the hub is told:
///
/// - peer closed → unregister
/// - transport lost (read error, idle, failed write) → detach with what
///   could not be written
/// - queue closed by the hub, or hub gone → nothing to report
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, admission: Admission) {
    let id = admission.id.clone();
    let settings = state.pump_settings;

    // The hub holds the only strong sender, so dropping it closes the queue.
    let (outbound_tx, outbound_rx) = mpsc::channel(settings.queue_capacity);
    let replies = outbound_tx.downgrade();

    let generation = match state
        .connect_client_usecase
        .execute(admission, outbound_tx)
        .await
    {
        Ok(generation) => generation,
        Err(e) => {
            tracing::warn!("Failed to register '{}': {}", id, e);
            let frame = CloseFrame {
                code: close_code::AGAIN,
                reason: e.to_string().into(),
            };
            if let Err(e) = socket.send(Message::Close(Some(frame))).await {
                tracing::debug!("Failed to send close frame to '{}': {}", id, e);
            }
            return;
        }
    };
    tracing::info!("Client '{}' connected (generation {})", id, generation.value());

    let (sink, stream) = socket.split();
    let (stop_tx, stop_rx) = oneshot::channel();
    let mut write_task = tokio::spawn(write_pump(
        sink,
        outbound_rx,
        stop_rx,
        settings.ping_interval,
        settings.write_timeout,
    ));

    let read = read_pump(
        stream,
        &id,
        &state.dispatch_frame_usecase,
        &replies,
        settings.idle_timeout,
    );
    tokio::pin!(read);

    let reason = tokio::select! {
        outcome = &mut read => {
            let _ = stop_tx.send(());
            let written = match (&mut write_task).await {
                Ok(written) => written,
                Err(e) => {
                    tracing::error!("Write loop of '{}' panicked: {}", id, e);
                    WriteOutcome::QueueClosed
                }
            };
            match outcome {
                ReadOutcome::PeerClosed => Some(DisconnectReason::Closed),
                outcome if outcome.is_loss() => Some(DisconnectReason::Lost {
                    undelivered: written.into_undelivered(),
                }),
                _ => None,
            }
        }
        written = &mut write_task => match written {
            Ok(WriteOutcome::QueueClosed) => {
                tracing::info!("Queue of '{}' closed by the hub", id);
                None
            }
            Ok(written) => Some(DisconnectReason::Lost {
                undelivered: written.into_undelivered(),
            }),
            Err(e) => {
                tracing::error!("Write loop of '{}' panicked: {}", id, e);
                Some(DisconnectReason::Lost { undelivered: Vec::new() })
            }
        },
    };

    let Some(reason) = reason else {
        return;
    };
    let closed = reason == DisconnectReason::Closed;
    match state
        .disconnect_client_usecase
        .execute(id.clone(), generation, reason)
        .await
    {
        Ok(()) if closed => tracing::info!("Client '{}' disconnected", id),
        Ok(()) => tracing::info!("Client '{}' lost its connection", id),
        Err(e) => tracing::warn!("Failed to disconnect '{}': {}", id, e),
    }
}
