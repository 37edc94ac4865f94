//! Persistence seam for the orchestrator.
//!
//! [`JobStore`] abstracts every read and write the pipeline performs, so
//! the orchestration logic can be exercised against an in-memory store in
//! tests. The production implementation is [`PgJobStore`](crate::pg::PgJobStore).

use async_trait::async_trait;
use storyreel_core::target::GenerationTarget;
use storyreel_core::types::DbId;
use storyreel_db::models::generation::Generation;
use storyreel_db::models::status::GenerationStatus;

/// The slice of an owner entity the pipeline needs to start or reconcile
/// a generation for one target.
#[derive(Debug, Clone, Default)]
pub struct TargetSnapshot {
    /// The prompt field backing this target (`image_prompt`,
    /// `video_prompt`, `appearance_prompt`, or `summary`).
    pub prompt: Option<String>,
    /// Upstream asset for derived generations: the completed image URL
    /// when the target is a shot video.
    pub reference_url: Option<String>,
    /// Whether the shot has a completed image. Always `false` for
    /// non-video targets.
    pub upstream_image_completed: bool,
    /// The external request id the entity currently tracks for this
    /// target's column group. The supersession tag.
    pub tracked_request_id: Option<String>,
}

/// Denormalized generation state written onto an owner entity's column
/// group. All three columns are written unconditionally.
#[derive(Debug, Clone)]
pub struct EntityGenerationState {
    pub status: GenerationStatus,
    pub request_id: Option<String>,
    /// Asset URL for media targets, the generated text for descriptions.
    pub result_ref: Option<String>,
}

/// Errors from a [`JobStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    EntityNotFound { entity: &'static str, id: DbId },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to serialize row image: {0}")]
    Serialize(String),
}

/// Every read and write the pipeline performs, behind one seam.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load the target's precondition fields and supersession tag.
    async fn load_target(&self, target: &GenerationTarget) -> Result<TargetSnapshot, StoreError>;

    /// Insert a new pending job row for the target.
    async fn create_job(
        &self,
        target: &GenerationTarget,
        provider: &str,
    ) -> Result<Generation, StoreError>;

    /// Record the provider-assigned request id and move the job to
    /// `Submitted`.
    async fn job_submitted(
        &self,
        job_id: DbId,
        external_request_id: &str,
    ) -> Result<(), StoreError>;

    /// Move the job to `Generating` unless it is already terminal.
    async fn job_generating(&self, job_id: DbId) -> Result<(), StoreError>;

    /// Mark the job completed with its asset reference, clearing any
    /// earlier failure reason.
    async fn job_completed(&self, job_id: DbId, result_ref: &str) -> Result<(), StoreError>;

    /// Mark the job failed with a reason, clearing any earlier result.
    async fn job_failed(&self, job_id: DbId, reason: &str) -> Result<(), StoreError>;

    /// Look up a job by its provider-assigned request id.
    async fn find_job_by_request_id(
        &self,
        external_request_id: &str,
    ) -> Result<Option<Generation>, StoreError>;

    /// Overwrite the target's denormalized state columns and return the
    /// post-update row image for the change feed.
    async fn write_entity_state(
        &self,
        target: &GenerationTarget,
        state: EntityGenerationState,
    ) -> Result<serde_json::Value, StoreError>;
}
