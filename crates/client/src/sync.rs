//! WebSocket synchronization session.
//!
//! [`SyncClient`] holds the connection configuration for the backend's
//! change feed. Call [`SyncClient::connect`] to establish a live
//! [`SyncSession`], subscribe it to the rows the view renders, and run
//! its receive loop until the view navigates away.

use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use storyreel_core::generation::OwnerEntityType;
use storyreel_core::types::DbId;
use storyreel_events::RowChangeEvent;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};
use tokio_util::sync::CancellationToken;

use crate::store::EditorStore;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Row subscription request, mirroring the server's feed protocol.
#[derive(Debug, Serialize)]
struct SubscribeFrame<'a> {
    action: &'static str,
    entity_type: &'a str,
    entity_id: DbId,
}

/// Errors from the sync session.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Configuration handle for the backend change feed.
pub struct SyncClient {
    ws_url: String,
}

impl SyncClient {
    /// * `ws_url` - change feed endpoint, e.g. `ws://host:3000/ws`.
    pub fn new(ws_url: String) -> Self {
        Self { ws_url }
    }

    /// Connect to the change feed.
    pub async fn connect(
        &self,
        store: Arc<Mutex<EditorStore>>,
    ) -> Result<SyncSession, SyncError> {
        let (ws_stream, _response) = connect_async(&self.ws_url)
            .await
            .map_err(|e| SyncError::Connection(format!("Failed to connect to {}: {e}", self.ws_url)))?;

        tracing::info!("Connected to change feed at {}", self.ws_url);

        Ok(SyncSession {
            store,
            ws_stream,
            cancel: CancellationToken::new(),
        })
    }
}

/// A live change feed session feeding one [`EditorStore`].
pub struct SyncSession {
    store: Arc<Mutex<EditorStore>>,
    ws_stream: WsStream,
    cancel: CancellationToken,
}

impl SyncSession {
    /// Token the owning view cancels on navigation away. The session
    /// closes the socket and returns; no server-side job is cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to one row's updates.
    pub async fn subscribe(
        &mut self,
        entity_type: OwnerEntityType,
        entity_id: DbId,
    ) -> Result<(), SyncError> {
        let frame = SubscribeFrame {
            action: "subscribe",
            entity_type: entity_type.as_str(),
            entity_id,
        };
        let text = serde_json::to_string(&frame)
            .map_err(|e| SyncError::Protocol(format!("Failed to encode subscribe frame: {e}")))?;
        self.ws_stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SyncError::Protocol(format!("Failed to send subscribe frame: {e}")))
    }

    /// Receive row images and converge the store until the socket closes
    /// or the session is cancelled.
    pub async fn run(mut self) -> Result<(), SyncError> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = self.ws_stream.close(None).await;
                    tracing::info!("Sync session cancelled");
                    return Ok(());
                }
                frame = self.ws_stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Change feed closed by server");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(SyncError::Protocol(format!("WebSocket receive error: {e}")));
                    }
                    None => return Ok(()),
                },
            }
        }
    }

    fn handle_text(&self, text: &str) {
        match serde_json::from_str::<RowChangeEvent>(text) {
            Ok(event) => {
                if let Ok(mut store) = self.store.lock() {
                    store.apply_remote(&event);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Failed to parse change event");
            }
        }
    }
}
