//! Shot entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyreel_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `shots` table.
///
/// Shots carry two independent denormalized generation states: the still
/// image and the video derived from it. Each tracks the latest job's
/// status, result URL, and external request id. The `*_request_id` column
/// is the supersession tag: terminal updates whose request id no longer
/// matches it never touch the row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Shot {
    pub id: DbId,
    pub scene_id: DbId,
    pub position: i32,
    // -- Image generation state --
    pub image_prompt: Option<String>,
    pub image_status_id: Option<StatusId>,
    pub image_url: Option<String>,
    pub image_request_id: Option<String>,
    // -- Video generation state --
    pub video_prompt: Option<String>,
    pub video_status_id: Option<StatusId>,
    pub video_url: Option<String>,
    pub video_request_id: Option<String>,
    // -- Timestamps --
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Shot {
    /// Whether the shot has a completed image, the precondition for
    /// starting a video generation.
    pub fn has_completed_image(&self) -> bool {
        self.image_status_id == Some(crate::models::status::GenerationStatus::Completed.id())
            && self.image_url.is_some()
    }
}

/// DTO for creating a new shot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShot {
    pub scene_id: DbId,
    pub position: Option<i32>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
}

/// DTO for updating an existing shot. User edits only; prompt changes
/// never touch generation status columns.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShot {
    pub position: Option<i32>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
}
