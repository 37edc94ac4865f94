use std::sync::Arc;

use storyreel_pipeline::GenerationOrchestrator;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: storyreel_db::DbPool,
    /// Server configuration (bind address, auth token, provider settings).
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (editor clients).
    pub ws_manager: Arc<WsManager>,
    /// In-process bus carrying row change events.
    pub event_bus: Arc<storyreel_events::EventBus>,
    /// Generation lifecycle coordinator shared by triggers and webhooks.
    pub orchestrator: Arc<GenerationOrchestrator>,
}
