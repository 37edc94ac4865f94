//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`RowChangeEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyreel_core::generation::OwnerEntityType;
use storyreel_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// RowChangeEvent
// ---------------------------------------------------------------------------

/// A change notification for a single owner-entity row.
///
/// Carries the complete post-update row image so subscribers can converge
/// their local state without a follow-up read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowChangeEvent {
    /// The kind of entity that changed (`shot`, `scene`, `character`).
    pub entity_type: OwnerEntityType,

    /// Database id of the changed row.
    pub entity_id: DbId,

    /// JSON image of the row after the update.
    pub row: serde_json::Value,

    /// When the change was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl RowChangeEvent {
    /// Create an event for a freshly-updated row.
    pub fn new(entity_type: OwnerEntityType, entity_id: DbId, row: serde_json::Value) -> Self {
        Self {
            entity_type,
            entity_id,
            row,
            timestamp: Utc::now(),
        }
    }

    /// Whether this event targets the given row.
    pub fn matches(&self, entity_type: OwnerEntityType, entity_id: DbId) -> bool {
        self.entity_type == entity_type && self.entity_id == entity_id
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`RowChangeEvent`].
pub struct EventBus {
    sender: broadcast::Sender<RowChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the row itself is already persisted, so nothing is lost.
    pub fn publish(&self, event: RowChangeEvent) {
        // A SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<RowChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(RowChangeEvent::new(
            OwnerEntityType::Shot,
            42,
            serde_json::json!({"image_status_id": 4}),
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.entity_type, OwnerEntityType::Shot);
        assert_eq!(received.entity_id, 42);
        assert_eq!(received.row["image_status_id"], 4);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(RowChangeEvent::new(
            OwnerEntityType::Scene,
            7,
            serde_json::Value::Null,
        ));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.entity_id, 7);
        assert_eq!(e2.entity_id, 7);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(RowChangeEvent::new(
            OwnerEntityType::Character,
            1,
            serde_json::Value::Null,
        ));
    }

    #[test]
    fn matches_filters_by_type_and_id() {
        let event = RowChangeEvent::new(OwnerEntityType::Shot, 5, serde_json::Value::Null);
        assert!(event.matches(OwnerEntityType::Shot, 5));
        assert!(!event.matches(OwnerEntityType::Shot, 6));
        assert!(!event.matches(OwnerEntityType::Scene, 5));
    }
}
