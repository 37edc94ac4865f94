//! Generation job entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyreel_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `generations` table: one request to an external AI
/// provider to produce an asset for an owner entity.
///
/// Rows are append-only history: a re-triggered generation inserts a new
/// row and the entity's tracked request id moves on; old rows keep their
/// terminal state forever.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Generation {
    pub id: DbId,
    pub owner_entity_type: String,
    pub owner_entity_id: DbId,
    pub kind: String,
    pub provider: String,
    /// Identifier assigned by the external provider; NULL until the
    /// submission succeeds.
    pub external_request_id: Option<String>,
    pub status_id: StatusId,
    /// Asset reference; set only when completed.
    pub result_ref: Option<String>,
    /// Failure detail; set only when failed. `"timeout"` marks polling
    /// budget exhaustion.
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body for the generation trigger endpoints. Both fields are passed
/// through to the provider opaquely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerGenerationRequest {
    pub aspect_ratio: Option<String>,
    pub model: Option<String>,
}

/// Query parameters for listing an entity's generation history.
#[derive(Debug, Deserialize)]
pub struct GenerationListQuery {
    /// Filter by kind (`image`, `video`, `text`).
    pub kind: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
