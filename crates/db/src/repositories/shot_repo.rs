//! Repository for the `shots` table.
//!
//! The image and video generation states are independent column groups;
//! each has its own state-write method so the pipeline updates exactly
//! one of them per job.

use sqlx::PgPool;
use storyreel_core::types::DbId;

use crate::models::shot::{CreateShot, Shot, UpdateShot};
use crate::models::status::StatusId;

/// Column list for `shots` queries.
const COLUMNS: &str = "\
    id, scene_id, position, \
    image_prompt, image_status_id, image_url, image_request_id, \
    video_prompt, video_status_id, video_url, video_request_id, \
    created_at, updated_at";

/// Provides CRUD and generation-state operations for shots.
pub struct ShotRepo;

impl ShotRepo {
    /// Insert a new shot.
    pub async fn create(pool: &PgPool, input: &CreateShot) -> Result<Shot, sqlx::Error> {
        let query = format!(
            "INSERT INTO shots (scene_id, position, image_prompt, video_prompt) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Shot>(&query)
            .bind(input.scene_id)
            .bind(input.position.unwrap_or(0))
            .bind(&input.image_prompt)
            .bind(&input.video_prompt)
            .fetch_one(pool)
            .await
    }

    /// Find a shot by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Shot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shots WHERE id = $1");
        sqlx::query_as::<_, Shot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a scene's shots in storyboard order.
    pub async fn list_by_scene(pool: &PgPool, scene_id: DbId) -> Result<Vec<Shot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shots WHERE scene_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, Shot>(&query)
            .bind(scene_id)
            .fetch_all(pool)
            .await
    }

    /// Patch user-editable fields. Generation state columns are untouched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateShot,
    ) -> Result<Option<Shot>, sqlx::Error> {
        let query = format!(
            "UPDATE shots \
             SET position = COALESCE($2, position), \
                 image_prompt = COALESCE($3, image_prompt), \
                 video_prompt = COALESCE($4, video_prompt), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Shot>(&query)
            .bind(id)
            .bind(input.position)
            .bind(&input.image_prompt)
            .bind(&input.video_prompt)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the denormalized image-generation state. Writes all three
    /// columns unconditionally; passing `None` clears a column.
    pub async fn update_image_state(
        pool: &PgPool,
        id: DbId,
        status_id: StatusId,
        request_id: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<Shot>, sqlx::Error> {
        let query = format!(
            "UPDATE shots \
             SET image_status_id = $2, \
                 image_request_id = $3, \
                 image_url = $4, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Shot>(&query)
            .bind(id)
            .bind(status_id)
            .bind(request_id)
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the denormalized video-generation state. Writes all three
    /// columns unconditionally; passing `None` clears a column.
    pub async fn update_video_state(
        pool: &PgPool,
        id: DbId,
        status_id: StatusId,
        request_id: Option<&str>,
        url: Option<&str>,
    ) -> Result<Option<Shot>, sqlx::Error> {
        let query = format!(
            "UPDATE shots \
             SET video_status_id = $2, \
                 video_request_id = $3, \
                 video_url = $4, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Shot>(&query)
            .bind(id)
            .bind(status_id)
            .bind(request_id)
            .bind(url)
            .fetch_optional(pool)
            .await
    }
}
