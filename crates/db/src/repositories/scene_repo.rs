//! Repository for the `scenes` table.
//!
//! User edits (title, summary, position) and pipeline writes (the
//! `description_*` generation state) go through separate methods so that
//! prompt editing can never clobber generation status.

use sqlx::PgPool;
use storyreel_core::types::DbId;

use crate::models::scene::{CreateScene, Scene, UpdateScene};
use crate::models::status::StatusId;

/// Column list for `scenes` queries.
const COLUMNS: &str = "\
    id, project_id, title, summary, position, \
    description, description_status_id, description_request_id, \
    created_at, updated_at";

/// Provides CRUD and generation-state operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Insert a new scene.
    pub async fn create(pool: &PgPool, input: &CreateScene) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (project_id, title, summary, position) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(input.position.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// Find a scene by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's scenes in storyboard order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenes WHERE project_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Patch user-editable fields. Generation state columns are untouched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScene,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes \
             SET title = COALESCE($2, title), \
                 summary = COALESCE($3, summary), \
                 position = COALESCE($4, position), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(input.position)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the denormalized description-generation state.
    ///
    /// Writes all four columns unconditionally: passing `None` clears a
    /// column. Only the pipeline calls this.
    pub async fn update_description_state(
        pool: &PgPool,
        id: DbId,
        status_id: StatusId,
        request_id: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes \
             SET description_status_id = $2, \
                 description_request_id = $3, \
                 description = $4, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(status_id)
            .bind(request_id)
            .bind(description)
            .fetch_optional(pool)
            .await
    }
}
