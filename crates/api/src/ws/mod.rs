//! WebSocket infrastructure for the realtime change feed.
//!
//! Provides connection management with per-row subscriptions, heartbeat
//! monitoring, the HTTP upgrade handler used by Axum routes, and the
//! forwarder task bridging the event bus onto subscribed connections.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::start_event_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
