//! Generation pipeline: orchestration, polling, and reconciliation.
//!
//! The orchestrator sits between the API layer and the provider adapters.
//! It owns the job lifecycle (pending, submitted, generating, terminal),
//! mirrors state onto the owning entity's denormalized columns, and
//! publishes every entity update on the event bus. Terminal states can
//! arrive from two directions at once (the polling loop and the webhook
//! receiver) and both funnel through the same reconciliation path.

pub mod error;
pub mod orchestrator;
pub mod pg;
pub mod reconcile;
pub mod store;

pub use error::PipelineError;
pub use orchestrator::{GenerationOptions, GenerationOrchestrator, PollConfig};
pub use pg::PgJobStore;
pub use reconcile::{apply_terminal, outcome_from_status, Applied};
pub use storyreel_core::target::GenerationTarget;
pub use store::{EntityGenerationState, JobStore, StoreError, TargetSnapshot};
