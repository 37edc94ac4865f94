use std::sync::Arc;

use storyreel_events::RowChangeEvent;
use tokio::sync::broadcast;

use crate::ws::manager::WsManager;

/// Spawn the bridge between the in-process event bus and the WebSocket
/// feed.
///
/// Every [`RowChangeEvent`] published on the bus is delivered to the
/// connections subscribed to that row. The task exits when the bus is
/// closed; a lagged receiver logs and keeps going, since each event
/// carries the full row image and a newer one supersedes anything missed.
pub fn start_event_forwarder(
    ws_manager: Arc<WsManager>,
    mut events: broadcast::Receiver<RowChangeEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let delivered = ws_manager.send_row_change(&event).await;
                    tracing::debug!(
                        entity_type = event.entity_type.as_str(),
                        entity_id = event.entity_id,
                        delivered,
                        "Row change forwarded to WebSocket subscribers"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event forwarder lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, stopping forwarder");
                    break;
                }
            }
        }
    })
}
