//! Terminal-state reconciliation.
//!
//! Both observers of a finished provider job, the polling loop and the
//! webhook receiver, funnel through [`apply_terminal`]. The decision of
//! what to write is made by the pure
//! [`reconcile_terminal`](storyreel_core::generation::reconcile_terminal);
//! this module performs the writes and publishes the change event.

use storyreel_core::generation::{
    invariant_holds, reconcile_terminal, GenerationKind, JobSnapshot, OwnerEntityType,
    ReconcileAction, TerminalOutcome, TerminalState,
};
use storyreel_core::target::GenerationTarget;
use storyreel_db::models::generation::Generation;
use storyreel_db::models::status::GenerationStatus;
use storyreel_events::{EventBus, RowChangeEvent};
use storyreel_providers::{ProviderJobState, ProviderJobStatus};

use crate::error::PipelineError;
use crate::store::{EntityGenerationState, JobStore, StoreError};

/// What [`apply_terminal`] actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Outcome written to the job row and mirrored onto the owner entity.
    JobAndEntity,
    /// Outcome written to the job row only; the entity tracks a newer
    /// request id.
    JobOnly,
    /// Nothing written; the job was already terminal with an
    /// authoritative state.
    Ignored,
}

/// Convert a provider status snapshot into a terminal outcome, or `None`
/// if the job is still in flight.
///
/// A completion without an asset reference is unusable and is recorded as
/// a failure rather than leaving a completed job with no result.
pub fn outcome_from_status(status: &ProviderJobStatus) -> Option<TerminalOutcome> {
    match status.state {
        ProviderJobState::Queued | ProviderJobState::Generating => None,
        ProviderJobState::Completed => Some(match &status.result_ref {
            Some(result_ref) => TerminalOutcome::completed(result_ref.clone()),
            None => TerminalOutcome::failed("provider reported completion without a result"),
        }),
        ProviderJobState::Failed => Some(TerminalOutcome::failed(
            status
                .failure_reason
                .clone()
                .unwrap_or_else(|| "provider reported failure".to_string()),
        )),
    }
}

/// Apply a terminal outcome observed for an external request id.
///
/// Looks up the job, decides via the reconciliation rule whether this
/// observation wins, and performs the corresponding writes. When the
/// owner entity is updated, its post-update row image is published on the
/// bus. Idempotent: re-delivering the same outcome is an [`Applied::Ignored`].
pub async fn apply_terminal(
    store: &dyn JobStore,
    bus: &EventBus,
    external_request_id: &str,
    outcome: TerminalOutcome,
) -> Result<Applied, PipelineError> {
    let job = store
        .find_job_by_request_id(external_request_id)
        .await?
        .ok_or_else(|| PipelineError::UnknownJob(external_request_id.to_string()))?;

    let entity_type = OwnerEntityType::parse(&job.owner_entity_type)?;
    let kind = GenerationKind::parse(&job.kind)?;
    let target = GenerationTarget::from_parts(entity_type, kind, job.owner_entity_id)?;

    // The entity may have been deleted since submission; the job row then
    // records the outcome on its own.
    let entity_tracks_this_request = match store.load_target(&target).await {
        Ok(snapshot) => snapshot.tracked_request_id.as_deref() == Some(external_request_id),
        Err(StoreError::EntityNotFound { .. }) => false,
        Err(err) => return Err(err.into()),
    };

    let status = GenerationStatus::from_id(job.status_id).ok_or(PipelineError::CorruptStatus {
        job_id: job.id,
        status_id: job.status_id,
    })?;

    let action = reconcile_terminal(
        JobSnapshot {
            is_terminal: status.is_terminal(),
            failure_reason: job.failure_reason.as_deref(),
        },
        outcome.state,
        entity_tracks_this_request,
    );

    match action {
        ReconcileAction::Ignore => {
            tracing::debug!(
                request_id = %external_request_id,
                job_id = job.id,
                "terminal update ignored, job already settled"
            );
            Ok(Applied::Ignored)
        }
        ReconcileAction::ApplyToJobOnly => {
            write_job(store, &job, &outcome).await?;
            tracing::info!(
                request_id = %external_request_id,
                job_id = job.id,
                "terminal state recorded for superseded job"
            );
            Ok(Applied::JobOnly)
        }
        ReconcileAction::ApplyToJobAndEntity => {
            write_job(store, &job, &outcome).await?;

            let entity_status = match outcome.state {
                TerminalState::Completed => GenerationStatus::Completed,
                TerminalState::Failed => GenerationStatus::Failed,
            };
            debug_assert!(invariant_holds(
                entity_status == GenerationStatus::Completed,
                entity_status == GenerationStatus::Failed,
                outcome.result_ref.as_deref(),
                outcome.failure_reason.as_deref(),
            ));

            let row = store
                .write_entity_state(
                    &target,
                    EntityGenerationState {
                        status: entity_status,
                        request_id: Some(external_request_id.to_string()),
                        result_ref: outcome.result_ref.clone(),
                    },
                )
                .await?;
            bus.publish(RowChangeEvent::new(
                target.entity_type(),
                target.entity_id(),
                row,
            ));

            tracing::info!(
                request_id = %external_request_id,
                job_id = job.id,
                entity_type = target.entity_type().as_str(),
                entity_id = target.entity_id(),
                status = ?entity_status,
                "terminal state applied"
            );
            Ok(Applied::JobAndEntity)
        }
    }
}

/// Persist the outcome on the job row.
async fn write_job(
    store: &dyn JobStore,
    job: &Generation,
    outcome: &TerminalOutcome,
) -> Result<(), PipelineError> {
    match (
        outcome.state,
        outcome.result_ref.as_deref(),
        outcome.failure_reason.as_deref(),
    ) {
        (TerminalState::Completed, Some(result_ref), _) => {
            store.job_completed(job.id, result_ref).await?;
        }
        (TerminalState::Failed, _, Some(reason)) => {
            store.job_failed(job.id, reason).await?;
        }
        _ => return Err(PipelineError::InconsistentOutcome),
    }
    Ok(())
}
