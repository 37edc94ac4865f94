//! Pipeline error type.

use storyreel_core::error::CoreError;
use storyreel_core::types::DbId;
use storyreel_db::models::status::StatusId;
use storyreel_providers::ProviderError;

use crate::store::StoreError;

/// Errors from orchestration and reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Domain-level failure: a precondition did not hold, or a persisted
    /// string failed to parse back into its enum.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The provider refused or could not take the submission.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A terminal notice arrived for a request id no job row carries.
    #[error("No generation job found for request id '{0}'")]
    UnknownJob(String),

    /// A job row carries a status id outside the seeded lookup table.
    #[error("Generation job {job_id} has unknown status id {status_id}")]
    CorruptStatus { job_id: DbId, status_id: StatusId },

    /// A terminal outcome lacked its result or failure reason. Cannot
    /// happen for outcomes built via the `TerminalOutcome` constructors.
    #[error("Terminal outcome is missing its result or failure reason")]
    InconsistentOutcome,
}
