//! Postgres-backed [`JobStore`] over the repository layer.

use async_trait::async_trait;
use storyreel_core::target::GenerationTarget;
use storyreel_core::types::DbId;
use storyreel_db::models::generation::Generation;
use storyreel_db::repositories::{CharacterRepo, GenerationRepo, SceneRepo, ShotRepo};
use storyreel_db::DbPool;

use crate::store::{EntityGenerationState, JobStore, StoreError, TargetSnapshot};

/// Production store: repositories over the shared connection pool.
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn load_target(&self, target: &GenerationTarget) -> Result<TargetSnapshot, StoreError> {
        match *target {
            GenerationTarget::ShotImage(id) => {
                let shot = ShotRepo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                Ok(TargetSnapshot {
                    prompt: shot.image_prompt,
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: shot.image_request_id,
                })
            }
            GenerationTarget::ShotVideo(id) => {
                let shot = ShotRepo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                let upstream_image_completed = shot.has_completed_image();
                Ok(TargetSnapshot {
                    prompt: shot.video_prompt,
                    reference_url: shot.image_url,
                    upstream_image_completed,
                    tracked_request_id: shot.video_request_id,
                })
            }
            GenerationTarget::CharacterPortrait(id) => {
                let character = CharacterRepo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(StoreError::EntityNotFound {
                        entity: "Character",
                        id,
                    })?;
                Ok(TargetSnapshot {
                    prompt: character.appearance_prompt,
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: character.portrait_request_id,
                })
            }
            GenerationTarget::SceneDescription(id) => {
                let scene = SceneRepo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(StoreError::EntityNotFound { entity: "Scene", id })?;
                Ok(TargetSnapshot {
                    prompt: scene.summary,
                    reference_url: None,
                    upstream_image_completed: false,
                    tracked_request_id: scene.description_request_id,
                })
            }
        }
    }

    async fn create_job(
        &self,
        target: &GenerationTarget,
        provider: &str,
    ) -> Result<Generation, StoreError> {
        Ok(GenerationRepo::create_pending(
            &self.pool,
            target.entity_type().as_str(),
            target.entity_id(),
            target.kind().as_str(),
            provider,
        )
        .await?)
    }

    async fn job_submitted(
        &self,
        job_id: DbId,
        external_request_id: &str,
    ) -> Result<(), StoreError> {
        Ok(GenerationRepo::mark_submitted(&self.pool, job_id, external_request_id).await?)
    }

    async fn job_generating(&self, job_id: DbId) -> Result<(), StoreError> {
        Ok(GenerationRepo::mark_generating(&self.pool, job_id).await?)
    }

    async fn job_completed(&self, job_id: DbId, result_ref: &str) -> Result<(), StoreError> {
        Ok(GenerationRepo::complete(&self.pool, job_id, result_ref).await?)
    }

    async fn job_failed(&self, job_id: DbId, reason: &str) -> Result<(), StoreError> {
        Ok(GenerationRepo::fail(&self.pool, job_id, reason).await?)
    }

    async fn find_job_by_request_id(
        &self,
        external_request_id: &str,
    ) -> Result<Option<Generation>, StoreError> {
        Ok(GenerationRepo::find_by_external_request_id(&self.pool, external_request_id).await?)
    }

    async fn write_entity_state(
        &self,
        target: &GenerationTarget,
        state: EntityGenerationState,
    ) -> Result<serde_json::Value, StoreError> {
        let status_id = state.status.id();
        let request_id = state.request_id.as_deref();
        let result_ref = state.result_ref.as_deref();

        match *target {
            GenerationTarget::ShotImage(id) => {
                let shot =
                    ShotRepo::update_image_state(&self.pool, id, status_id, request_id, result_ref)
                        .await?
                        .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                to_row_image(&shot)
            }
            GenerationTarget::ShotVideo(id) => {
                let shot =
                    ShotRepo::update_video_state(&self.pool, id, status_id, request_id, result_ref)
                        .await?
                        .ok_or(StoreError::EntityNotFound { entity: "Shot", id })?;
                to_row_image(&shot)
            }
            GenerationTarget::CharacterPortrait(id) => {
                let character = CharacterRepo::update_portrait_state(
                    &self.pool, id, status_id, request_id, result_ref,
                )
                .await?
                .ok_or(StoreError::EntityNotFound {
                    entity: "Character",
                    id,
                })?;
                to_row_image(&character)
            }
            GenerationTarget::SceneDescription(id) => {
                let scene = SceneRepo::update_description_state(
                    &self.pool, id, status_id, request_id, result_ref,
                )
                .await?
                .ok_or(StoreError::EntityNotFound { entity: "Scene", id })?;
                to_row_image(&scene)
            }
        }
    }
}

fn to_row_image<T: serde::Serialize>(row: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(row).map_err(|e| StoreError::Serialize(e.to_string()))
}
