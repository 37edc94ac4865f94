//! Scene entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyreel_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `scenes` table.
///
/// The `description_*` columns are a denormalized copy of the latest
/// text-generation job's state so the UI can render without joining
/// against `generations`. They are mutated only by the pipeline, never by
/// user edits.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    /// User-editable one-line summary; the precondition for description
    /// generation.
    pub summary: Option<String>,
    pub position: i32,
    // -- Generation state (text kind) --
    pub description: Option<String>,
    pub description_status_id: Option<StatusId>,
    pub description_request_id: Option<String>,
    // -- Timestamps --
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new scene.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScene {
    pub project_id: DbId,
    pub title: String,
    pub summary: Option<String>,
    pub position: Option<i32>,
}

/// DTO for updating an existing scene. User edits only; generation state
/// columns are deliberately absent.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScene {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub position: Option<i32>,
}
