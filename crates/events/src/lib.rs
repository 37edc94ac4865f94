//! Realtime change feed for owner entities.
//!
//! Every mutation of a scene, shot, or character row publishes the
//! post-update row image on the [`EventBus`]; the API layer fans events
//! out to WebSocket clients subscribed to individual rows.

pub mod bus;

pub use bus::{EventBus, RowChangeEvent};
