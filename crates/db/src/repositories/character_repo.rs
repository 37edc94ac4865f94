//! Repository for the `characters` table.

use sqlx::PgPool;
use storyreel_core::types::DbId;

use crate::models::character::{Character, CreateCharacter, UpdateCharacter};
use crate::models::status::StatusId;

/// Column list for `characters` queries.
const COLUMNS: &str = "\
    id, project_id, name, appearance_prompt, \
    portrait_status_id, portrait_url, portrait_request_id, \
    created_at, updated_at";

/// Provides CRUD and generation-state operations for characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// Insert a new character.
    pub async fn create(pool: &PgPool, input: &CreateCharacter) -> Result<Character, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters (project_id, name, appearance_prompt) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.appearance_prompt)
            .fetch_one(pool)
            .await
    }

    /// Find a character by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's characters by name.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters WHERE project_id = $1 ORDER BY name, id"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Patch user-editable fields. Generation state columns are untouched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters \
             SET name = COALESCE($2, name), \
                 appearance_prompt = COALESCE($3, appearance_prompt), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.appearance_prompt)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the denormalized portrait-generation state. Writes all
    /// three columns unconditionally; passing `None` clears a column.
    pub async fn update_portrait_state(
        pool: &PgPool,
        id: DbId,
        status_id: StatusId,
        request_id: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<Character>, sqlx::Error> {
        let query = format!(
            "UPDATE characters \
             SET portrait_status_id = $2, \
                 portrait_request_id = $3, \
                 portrait_url = $4, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Character>(&query)
            .bind(id)
            .bind(status_id)
            .bind(request_id)
            .bind(url)
            .fetch_optional(pool)
            .await
    }
}
