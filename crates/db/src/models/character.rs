//! Character entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyreel_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `characters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    /// User-editable appearance prompt; the precondition for portrait
    /// generation.
    pub appearance_prompt: Option<String>,
    // -- Portrait generation state --
    pub portrait_status_id: Option<StatusId>,
    pub portrait_url: Option<String>,
    pub portrait_request_id: Option<String>,
    // -- Timestamps --
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacter {
    pub project_id: DbId,
    pub name: String,
    pub appearance_prompt: Option<String>,
}

/// DTO for updating an existing character. User edits only.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub appearance_prompt: Option<String>,
}
