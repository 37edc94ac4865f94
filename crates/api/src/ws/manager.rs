use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use storyreel_core::generation::OwnerEntityType;
use storyreel_core::types::{DbId, Timestamp};
use storyreel_events::RowChangeEvent;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Rows this connection has subscribed to.
    pub subscriptions: HashSet<(OwnerEntityType, DbId)>,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections and their row subscriptions.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            subscriptions: HashSet::new(),
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Subscribe a connection to one row's change events.
    pub async fn subscribe(&self, conn_id: &str, entity_type: OwnerEntityType, entity_id: DbId) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.subscriptions.insert((entity_type, entity_id));
        }
    }

    /// Drop a connection's subscription to one row.
    pub async fn unsubscribe(&self, conn_id: &str, entity_type: OwnerEntityType, entity_id: DbId) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.subscriptions.remove(&(entity_type, entity_id));
        }
    }

    /// Deliver a row change event to every connection subscribed to that
    /// row. Returns the number of connections the event was sent to.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn send_row_change(&self, event: &RowChangeEvent) -> usize {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize row change event");
                return 0;
            }
        };

        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn
                .subscriptions
                .contains(&(event.entity_type, event.entity_id))
            {
                let _ = conn.sender.send(Message::Text(text.clone().into()));
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
