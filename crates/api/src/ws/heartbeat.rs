use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Seconds between Ping frames.
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn the keepalive task for the change feed.
///
/// Editor sessions can sit idle for minutes between generations; periodic
/// Ping frames keep intermediaries from reaping the connection and let the
/// receive loop notice dead peers. Aborted explicitly during shutdown via
/// the returned handle.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = ws_manager.connection_count().await;
            if count == 0 {
                continue;
            }
            tracing::debug!(count, "Pinging change feed connections");
            ws_manager.ping_all().await;
        }
    })
}
