//! Editor-side synchronization library.
//!
//! Triggers generations against the backend, keeps an explicitly-owned
//! local state container, and converges it with the server's change feed
//! over WebSocket. The store guards the client's own optimistic edits
//! against out-of-order notifications; everything else is overwritten
//! with the server's row image.

pub mod requester;
pub mod store;
pub mod sync;
pub mod trigger;

pub use requester::GenerationRequester;
pub use store::{Convergence, EditorStore};
pub use sync::{SyncClient, SyncError, SyncSession};
pub use trigger::{GenerationTrigger, HttpTrigger, TriggerError, TriggerOptions, TriggeredJob};
