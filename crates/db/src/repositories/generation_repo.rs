//! Repository for the `generations` table, the append-only job history.
//!
//! Uses `GenerationStatus` from `models::status` for all status
//! transitions; every status literal is a named constant.

use sqlx::PgPool;
use storyreel_core::types::DbId;

use crate::models::generation::{Generation, GenerationListQuery};
use crate::models::status::GenerationStatus;

/// Column list for `generations` queries.
const COLUMNS: &str = "\
    id, owner_entity_type, owner_entity_id, kind, provider, \
    external_request_id, status_id, result_ref, failure_reason, \
    created_at, updated_at";

/// Maximum page size for history listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for history listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides lifecycle operations for generation jobs.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new pending job for an owner entity.
    pub async fn create_pending(
        pool: &PgPool,
        owner_entity_type: &str,
        owner_entity_id: DbId,
        kind: &str,
        provider: &str,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations \
                 (owner_entity_type, owner_entity_id, kind, provider, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(owner_entity_type)
            .bind(owner_entity_id)
            .bind(kind)
            .bind(provider)
            .bind(GenerationStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Record the provider-assigned request id after a successful
    /// submission and move the job to `Submitted`.
    pub async fn mark_submitted(
        pool: &PgPool,
        id: DbId,
        external_request_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations \
             SET status_id = $2, external_request_id = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(GenerationStatus::Submitted.id())
        .bind(external_request_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Move a submitted job to `Generating` when the provider first
    /// reports work in progress. A no-op once the job is terminal.
    pub async fn mark_generating(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($3, $4)",
        )
        .bind(id)
        .bind(GenerationStatus::Generating.id())
        .bind(GenerationStatus::Completed.id())
        .bind(GenerationStatus::Failed.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job completed with its asset reference.
    ///
    /// Also clears `failure_reason` so the status/result invariant holds
    /// after a timeout upgrade.
    pub async fn complete(pool: &PgPool, id: DbId, result_ref: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations \
             SET status_id = $2, result_ref = $3, failure_reason = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(GenerationStatus::Completed.id())
        .bind(result_ref)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job failed with the provider's (or the pipeline's) reason.
    pub async fn fail(pool: &PgPool, id: DbId, reason: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations \
             SET status_id = $2, failure_reason = $3, result_ref = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(GenerationStatus::Failed.id())
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE id = $1");
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a job by the provider-assigned request id. This is the webhook
    /// lookup path; the column is unique so at most one row matches.
    pub async fn find_by_external_request_id(
        pool: &PgPool,
        external_request_id: &str,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generations WHERE external_request_id = $1"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(external_request_id)
            .fetch_optional(pool)
            .await
    }

    /// List an entity's job history, newest first, with optional kind
    /// filter and pagination.
    pub async fn list_for_entity(
        pool: &PgPool,
        owner_entity_type: &str,
        owner_entity_id: DbId,
        params: &GenerationListQuery,
    ) -> Result<Vec<Generation>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM generations \
             WHERE owner_entity_type = $1 AND owner_entity_id = $2 \
               AND ($3::TEXT IS NULL OR kind = $3) \
             ORDER BY created_at DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(owner_entity_type)
            .bind(owner_entity_id)
            .bind(&params.kind)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
