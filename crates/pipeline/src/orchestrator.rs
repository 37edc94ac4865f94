//! The generation orchestrator: trigger, submit, poll.
//!
//! One [`GenerationOrchestrator`] is shared by all trigger endpoints and
//! the webhook receiver. It owns the optimistic entity updates, the
//! provider submission, and the polling loop; terminal writes go through
//! [`crate::reconcile::apply_terminal`] so polling and webhooks can never
//! disagree.

use std::sync::Arc;
use std::time::Duration;

use storyreel_core::generation::{require_completed_image, require_prompt, TerminalOutcome};
use storyreel_core::target::GenerationTarget;
use storyreel_db::models::generation::{Generation, TriggerGenerationRequest};
use storyreel_db::models::status::GenerationStatus;
use storyreel_events::{EventBus, RowChangeEvent};
use storyreel_providers::{GenerationRequest, ProviderError, ProviderSet};

use crate::error::PipelineError;
use crate::reconcile::{apply_terminal, outcome_from_status, Applied};
use crate::store::{EntityGenerationState, JobStore, TargetSnapshot};

/// Pass-through options supplied by the trigger request.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub aspect_ratio: Option<String>,
    pub model: Option<String>,
}

impl From<TriggerGenerationRequest> for GenerationOptions {
    fn from(body: TriggerGenerationRequest) -> Self {
        Self {
            aspect_ratio: body.aspect_ratio,
            model: body.model,
        }
    }
}

/// Polling behavior for jobs whose provider does not deliver a webhook
/// first.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between status lookups.
    pub interval: Duration,
    /// Total status lookups before the job is recorded as timed out.
    /// A lookup that fails transiently still consumes an attempt, so the
    /// loop is bounded even against a dead provider.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Coordinates the full lifecycle of generation jobs.
pub struct GenerationOrchestrator {
    store: Arc<dyn JobStore>,
    providers: Arc<ProviderSet>,
    bus: Arc<EventBus>,
    poll: PollConfig,
}

impl GenerationOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, providers: Arc<ProviderSet>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            providers,
            bus,
            poll: PollConfig::default(),
        }
    }

    /// Override the default polling behavior.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Start a generation for one target.
    ///
    /// Checks the target's precondition, inserts the job row, flips the
    /// entity to `Submitted` optimistically, and submits to the provider.
    /// On acceptance the job carries the provider-assigned request id and
    /// the caller is expected to [`spawn_poll`](Self::spawn_poll); on
    /// rejection the job and entity are marked failed and the error is
    /// returned.
    pub async fn start_generation(
        &self,
        target: GenerationTarget,
        options: GenerationOptions,
    ) -> Result<Generation, PipelineError> {
        let snapshot = self.store.load_target(&target).await?;
        check_precondition(target, &snapshot)?;

        let provider = self.providers.for_kind(target.kind());
        let mut job = self
            .store
            .create_job(&target, provider.id().as_str())
            .await?;

        tracing::info!(
            job_id = job.id,
            entity_type = target.entity_type().as_str(),
            entity_id = target.entity_id(),
            kind = target.kind().as_str(),
            provider = provider.id().as_str(),
            "generation triggered"
        );

        // Optimistic update: flip the entity to Submitted and clear the
        // previous result before the provider round-trip, so clients see
        // the state change immediately.
        self.write_and_publish(
            target,
            EntityGenerationState {
                status: GenerationStatus::Submitted,
                request_id: None,
                result_ref: None,
            },
        )
        .await?;

        let request = GenerationRequest {
            prompt: snapshot.prompt.clone().unwrap_or_default(),
            reference_url: snapshot.reference_url.clone(),
            aspect_ratio: options.aspect_ratio,
            model: options.model,
        };

        match provider.submit(&request).await {
            Ok(submission) => {
                self.store
                    .job_submitted(job.id, &submission.external_request_id)
                    .await?;
                self.write_and_publish(
                    target,
                    EntityGenerationState {
                        status: GenerationStatus::Submitted,
                        request_id: Some(submission.external_request_id.clone()),
                        result_ref: None,
                    },
                )
                .await?;

                tracing::info!(
                    job_id = job.id,
                    request_id = %submission.external_request_id,
                    "submission accepted"
                );
                job.status_id = GenerationStatus::Submitted.id();
                job.external_request_id = Some(submission.external_request_id);
                Ok(job)
            }
            Err(err) => {
                let reason = err.to_string();
                self.store.job_failed(job.id, &reason).await?;
                self.write_and_publish(
                    target,
                    EntityGenerationState {
                        status: GenerationStatus::Failed,
                        request_id: None,
                        result_ref: None,
                    },
                )
                .await?;

                tracing::warn!(job_id = job.id, error = %reason, "submission failed");
                Err(PipelineError::Provider(err))
            }
        }
    }

    /// Spawn the polling loop for an accepted submission as a background
    /// task. Errors inside the loop are logged, not propagated; the job
    /// row is the source of truth for the final state.
    pub fn spawn_poll(
        self: &Arc<Self>,
        target: GenerationTarget,
        external_request_id: String,
    ) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = orchestrator
                .poll_until_terminal(target, &external_request_id)
                .await
            {
                tracing::error!(
                    request_id = %external_request_id,
                    error = %err,
                    "polling loop aborted"
                );
            }
        })
    }

    /// Poll the provider until the job reaches a terminal state or the
    /// attempt budget runs out, then reconcile.
    ///
    /// Transient lookup failures consume an attempt and the loop moves
    /// on; a rejection means the provider no longer honors this request
    /// id, so the job is settled as a provider failure immediately. The
    /// first `Generating` observation is mirrored onto the job and
    /// entity; later ones are no-ops. On budget exhaustion a timeout
    /// failure is recorded, which a later webhook completion may upgrade.
    pub async fn poll_until_terminal(
        &self,
        target: GenerationTarget,
        external_request_id: &str,
    ) -> Result<Applied, PipelineError> {
        let provider = self.providers.for_kind(target.kind());
        let mut marked_generating = false;

        for attempt in 1..=self.poll.max_attempts {
            tokio::time::sleep(self.poll.interval).await;

            let status = match provider.fetch_status(external_request_id).await {
                Ok(status) => status,
                Err(err @ ProviderError::Rejected { .. }) => {
                    tracing::warn!(
                        request_id = %external_request_id,
                        error = %err,
                        "provider rejected the request during polling"
                    );
                    return apply_terminal(
                        self.store.as_ref(),
                        &self.bus,
                        external_request_id,
                        TerminalOutcome::failed(err.to_string()),
                    )
                    .await;
                }
                Err(err) => {
                    tracing::warn!(
                        request_id = %external_request_id,
                        attempt,
                        error = %err,
                        "status poll failed"
                    );
                    continue;
                }
            };

            match outcome_from_status(&status) {
                Some(outcome) => {
                    return apply_terminal(
                        self.store.as_ref(),
                        &self.bus,
                        external_request_id,
                        outcome,
                    )
                    .await;
                }
                None => {
                    if status.state == storyreel_providers::ProviderJobState::Generating
                        && !marked_generating
                    {
                        self.mark_generating(target, external_request_id).await?;
                        marked_generating = true;
                    }
                }
            }
        }

        tracing::warn!(
            request_id = %external_request_id,
            max_attempts = self.poll.max_attempts,
            "polling budget exhausted, recording timeout"
        );
        apply_terminal(
            self.store.as_ref(),
            &self.bus,
            external_request_id,
            TerminalOutcome::timed_out(),
        )
        .await
    }

    /// Apply a terminal outcome delivered out of band (webhook path).
    pub async fn apply_terminal(
        &self,
        external_request_id: &str,
        outcome: TerminalOutcome,
    ) -> Result<Applied, PipelineError> {
        apply_terminal(self.store.as_ref(), &self.bus, external_request_id, outcome).await
    }

    /// Mirror the first `Generating` observation onto the job and, if the
    /// entity still tracks this request, onto the entity.
    async fn mark_generating(
        &self,
        target: GenerationTarget,
        external_request_id: &str,
    ) -> Result<(), PipelineError> {
        let job = self
            .store
            .find_job_by_request_id(external_request_id)
            .await?
            .ok_or_else(|| PipelineError::UnknownJob(external_request_id.to_string()))?;

        // A webhook may already have settled the job between polls.
        if GenerationStatus::from_id(job.status_id).is_some_and(GenerationStatus::is_terminal) {
            return Ok(());
        }
        self.store.job_generating(job.id).await?;

        let snapshot = self.store.load_target(&target).await?;
        if snapshot.tracked_request_id.as_deref() == Some(external_request_id) {
            self.write_and_publish(
                target,
                EntityGenerationState {
                    status: GenerationStatus::Generating,
                    request_id: Some(external_request_id.to_string()),
                    result_ref: None,
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn write_and_publish(
        &self,
        target: GenerationTarget,
        state: EntityGenerationState,
    ) -> Result<(), PipelineError> {
        let row = self.store.write_entity_state(&target, state).await?;
        self.bus.publish(RowChangeEvent::new(
            target.entity_type(),
            target.entity_id(),
            row,
        ));
        Ok(())
    }
}

/// Enforce the target's start precondition against the loaded snapshot.
fn check_precondition(
    target: GenerationTarget,
    snapshot: &TargetSnapshot,
) -> Result<(), PipelineError> {
    match target {
        GenerationTarget::ShotImage(_) => {
            require_prompt("image_prompt", snapshot.prompt.as_deref())?
        }
        GenerationTarget::ShotVideo(_) => {
            require_completed_image(snapshot.upstream_image_completed)?
        }
        GenerationTarget::CharacterPortrait(_) => {
            require_prompt("appearance_prompt", snapshot.prompt.as_deref())?
        }
        GenerationTarget::SceneDescription(_) => {
            require_prompt("summary", snapshot.prompt.as_deref())?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_precondition_requires_a_prompt() {
        let snapshot = TargetSnapshot::default();
        assert!(check_precondition(GenerationTarget::ShotImage(1), &snapshot).is_err());

        let snapshot = TargetSnapshot {
            prompt: Some("red bicycle".to_string()),
            ..TargetSnapshot::default()
        };
        assert!(check_precondition(GenerationTarget::ShotImage(1), &snapshot).is_ok());
    }

    #[test]
    fn video_precondition_requires_a_completed_image() {
        let snapshot = TargetSnapshot {
            prompt: Some("slow pan".to_string()),
            ..TargetSnapshot::default()
        };
        assert!(check_precondition(GenerationTarget::ShotVideo(1), &snapshot).is_err());

        let snapshot = TargetSnapshot {
            upstream_image_completed: true,
            ..TargetSnapshot::default()
        };
        assert!(check_precondition(GenerationTarget::ShotVideo(1), &snapshot).is_ok());
    }
}
