use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use storyreel_core::generation::OwnerEntityType;
use storyreel_core::types::DbId;

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Inbound control frame from an editor client.
///
/// ```json
/// { "action": "subscribe", "entity_type": "shot", "entity_id": 42 }
/// ```
#[derive(Debug, Deserialize)]
struct ClientFrame {
    action: String,
    entity_type: String,
    entity_id: DbId,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and
/// managed by two tasks (sender + receiver). Row change events are pushed
/// to the connection for every row it subscribes to.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes subscribe/unsubscribe frames on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                handle_frame(&ws_manager, &conn_id, &text).await;
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply one subscribe/unsubscribe frame. Malformed frames are logged and
/// dropped; the connection stays open.
async fn handle_frame(ws_manager: &WsManager, conn_id: &str, text: &str) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Unparseable client frame");
            return;
        }
    };

    let entity_type = match OwnerEntityType::parse(&frame.entity_type) {
        Ok(entity_type) => entity_type,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Bad entity type in client frame");
            return;
        }
    };

    match frame.action.as_str() {
        "subscribe" => {
            ws_manager
                .subscribe(conn_id, entity_type, frame.entity_id)
                .await;
            tracing::debug!(
                conn_id = %conn_id,
                entity_type = entity_type.as_str(),
                entity_id = frame.entity_id,
                "Row subscription added"
            );
        }
        "unsubscribe" => {
            ws_manager
                .unsubscribe(conn_id, entity_type, frame.entity_id)
                .await;
        }
        other => {
            tracing::debug!(conn_id = %conn_id, action = %other, "Unknown client action");
        }
    }
}
