//! WebSocket API handler: device event loop and connection lifecycle.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        ConnectInfo, Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use roomcast_types::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound queue depth per connection. Bounded so a slow consumer cannot
/// grow memory without limit; beyond this, events for it are dropped.
const OUTBOUND_QUEUE_DEPTH: usize = 256;

/// Sends a JSON-serialized error event over the connection's sender channel.
fn send_ws_error(tx: &mpsc::Sender<String>, message: String) {
    match serde_json::to_string(&ServerEvent::Error { message }) {
        Ok(json) => {
            if let Err(e) = tx.try_send(json) {
                tracing::warn!("failed to send WebSocket error to client: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("failed to serialize WebSocket error event: {}", e);
        }
    }
}

/// WebSocket handler: `GET /ws`.
///
/// Devices are anonymous; each upgrade gets a fresh connection id that lives
/// exactly as long as the link.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// Handles the WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) {
    let connection_id = Uuid::new_v4();
    tracing::info!(connection_id = %connection_id, remote_addr = %addr, "device connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_DEPTH);

    state.connections.register(connection_id, tx.clone()).await;

    // Forward queued events to the websocket sender.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(AxumMessage::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        if let AxumMessage::Text(text) = msg {
            match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(ClientEvent::JoinRoom { room_id, device_type }) => {
                    tracing::info!(
                        connection_id = %connection_id,
                        room_id = %room_id,
                        role = device_type.label(),
                        "device joined room"
                    );
                    state.connections.join(connection_id, &room_id, device_type).await;
                }
                Ok(ClientEvent::LeaveRoom { room_id }) => {
                    tracing::info!(
                        connection_id = %connection_id,
                        room_id = %room_id,
                        "device left room"
                    );
                    state.connections.leave(connection_id, &room_id).await;
                }
                Err(_) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "failed to parse incoming WebSocket event"
                    );
                    send_ws_error(&tx, "invalid event format".to_string());
                }
            }
        } else if let AxumMessage::Close(_) = msg {
            break;
        }
    }

    // Terminal cleanup; the cached room affiliation is not trusted.
    state.connections.disconnect(connection_id).await;
    send_task.abort();
    tracing::info!(connection_id = %connection_id, "device disconnected");
}
