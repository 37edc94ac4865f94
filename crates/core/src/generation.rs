//! Generation job state machine: kinds, terminal outcomes, precondition
//! checks, and the reconciliation decision shared by the polling loop and
//! the webhook receiver.
//!
//! Everything here is pure. Persistence lives in `storyreel-db`; the
//! orchestration that calls these functions lives in `storyreel-pipeline`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Kinds and owner entity types
// ---------------------------------------------------------------------------

/// What a generation job produces. Each kind is backed by exactly one
/// provider adapter; dispatch on this enum is always exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Image,
    Video,
    Text,
}

impl GenerationKind {
    /// Stable string form stored in the `generations.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Image => "image",
            GenerationKind::Video => "video",
            GenerationKind::Text => "text",
        }
    }

    /// Parse the stored string form back into the enum.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "image" => Ok(GenerationKind::Image),
            "video" => Ok(GenerationKind::Video),
            "text" => Ok(GenerationKind::Text),
            other => Err(CoreError::Validation(format!(
                "Unknown generation kind '{other}'"
            ))),
        }
    }
}

/// The domain record a job's output is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerEntityType {
    Shot,
    Scene,
    Character,
}

impl OwnerEntityType {
    /// Stable string form stored in `generations.owner_entity_type` and
    /// used as the change-feed `entity_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerEntityType::Shot => "shot",
            OwnerEntityType::Scene => "scene",
            OwnerEntityType::Character => "character",
        }
    }

    /// Parse the stored string form back into the enum.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "shot" => Ok(OwnerEntityType::Shot),
            "scene" => Ok(OwnerEntityType::Scene),
            "character" => Ok(OwnerEntityType::Character),
            other => Err(CoreError::Validation(format!(
                "Unknown owner entity type '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal outcomes
// ---------------------------------------------------------------------------

/// Failure reason recorded when the polling budget is exhausted without a
/// terminal provider state. A job failed with this reason may later be
/// upgraded to completed by an authoritative webhook (see [`reconcile_terminal`]).
pub const TIMEOUT_REASON: &str = "timeout";

/// The two terminal states a job can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Completed,
    Failed,
}

/// A terminal provider result, ready to be written to the job record and
/// mirrored onto the owner entity.
///
/// Construct via [`TerminalOutcome::completed`] / [`TerminalOutcome::failed`]
/// so the status/result invariant holds by construction: `result_ref` is
/// set iff completed, `failure_reason` is set iff failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutcome {
    pub state: TerminalState,
    pub result_ref: Option<String>,
    pub failure_reason: Option<String>,
}

impl TerminalOutcome {
    /// A successful completion carrying the produced asset reference
    /// (URL for media kinds, inline text for the text kind).
    pub fn completed(result_ref: impl Into<String>) -> Self {
        Self {
            state: TerminalState::Completed,
            result_ref: Some(result_ref.into()),
            failure_reason: None,
        }
    }

    /// A failure carrying the provider's (or the pipeline's) reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: TerminalState::Failed,
            result_ref: None,
            failure_reason: Some(reason.into()),
        }
    }

    /// The timeout failure written when the polling budget is exhausted.
    pub fn timed_out() -> Self {
        Self::failed(TIMEOUT_REASON)
    }
}

/// Check the job invariant: `result_ref` non-null iff completed,
/// `failure_reason` non-null iff failed. Used by tests after every
/// transition and by the reconciler as a debug assertion.
pub fn invariant_holds(
    is_completed: bool,
    is_failed: bool,
    result_ref: Option<&str>,
    failure_reason: Option<&str>,
) -> bool {
    result_ref.is_some() == is_completed && failure_reason.is_some() == is_failed
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Require a non-empty prompt field before a prompt-driven generation
/// (image, portrait, description) may start.
pub fn require_prompt(field: &'static str, value: Option<&str>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CoreError::Precondition(format!(
            "{field} must be set before generation can start"
        ))),
    }
}

/// Require a completed image before a video generation may start.
pub fn require_completed_image(image_completed: bool) -> Result<(), CoreError> {
    if image_completed {
        Ok(())
    } else {
        Err(CoreError::Precondition(
            "Shot must have a completed image before video generation can start".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// What the terminal-state writer should do with an incoming provider
/// result. Produced by [`reconcile_terminal`], applied by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Write the outcome to the job record and mirror it onto the owner
    /// entity's denormalized status/result columns.
    ApplyToJobAndEntity,
    /// Write the outcome to the job record only. The owner entity tracks a
    /// newer request id, so this job has been superseded and must not
    /// touch the entity.
    ApplyToJobOnly,
    /// The job is already terminal with an authoritative state. Drop the
    /// update entirely (idempotent re-delivery, or a stale duplicate).
    Ignore,
}

/// Snapshot of the job record as currently persisted, as seen by the
/// reconciler before deciding what to do with an incoming terminal state.
#[derive(Debug, Clone, Copy)]
pub struct JobSnapshot<'a> {
    /// Whether the job is already in a terminal state (completed or failed).
    pub is_terminal: bool,
    /// The persisted failure reason, if the job is failed.
    pub failure_reason: Option<&'a str>,
}

/// Decide how to apply a terminal provider state to a job record.
///
/// Whichever path (polling loop or webhook) observes a terminal state
/// first performs the write; the second observer must no-op. Two
/// refinements on top of plain "first terminal wins":
///
/// - **Timeout upgrade**: a job failed with [`TIMEOUT_REASON`] is not
///   authoritative: the provider-side job may still have completed. A
///   later `Completed` for the same request id is applied over it. A
///   provider-reported failure is never upgraded.
/// - **Supersession**: when the owner entity tracks a different (newer)
///   request id, the outcome is recorded on the job row for history but
///   never mirrored onto the entity.
pub fn reconcile_terminal(
    job: JobSnapshot<'_>,
    incoming: TerminalState,
    entity_tracks_this_request: bool,
) -> ReconcileAction {
    if job.is_terminal {
        let upgradeable =
            incoming == TerminalState::Completed && job.failure_reason == Some(TIMEOUT_REASON);
        if !upgradeable {
            return ReconcileAction::Ignore;
        }
    }

    if entity_tracks_this_request {
        ReconcileAction::ApplyToJobAndEntity
    } else {
        ReconcileAction::ApplyToJobOnly
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
