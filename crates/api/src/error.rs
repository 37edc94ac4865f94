use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storyreel_core::error::CoreError;
use storyreel_pipeline::{PipelineError, StoreError};
use storyreel_providers::ProviderError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`PipelineError`] for
/// orchestration failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `storyreel_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A generation pipeline error (precondition, provider, store).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Pipeline(pipeline) => classify_pipeline_error(pipeline),
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error onto an HTTP status, error code, and message.
fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Precondition(msg) => {
            (StatusCode::BAD_REQUEST, "PRECONDITION_FAILED", msg.clone())
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Map a pipeline error onto an HTTP status, error code, and message.
///
/// Provider refusals surface the provider's own message so the editor can
/// show it; transient provider trouble and internal inconsistencies are
/// sanitized 5xx responses.
fn classify_pipeline_error(pipeline: &PipelineError) -> (StatusCode, &'static str, String) {
    match pipeline {
        PipelineError::Core(core) => classify_core_error(core),
        PipelineError::Provider(provider) => match provider {
            ProviderError::Rejected { .. } => (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_REJECTED",
                provider.to_string(),
            ),
            ProviderError::Unavailable(_) | ProviderError::Malformed(_) => {
                tracing::error!(error = %provider, "Provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_UNAVAILABLE",
                    "The generation provider is unavailable".to_string(),
                )
            }
        },
        PipelineError::Store(store) => match store {
            StoreError::EntityNotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            StoreError::Database(err) => classify_sqlx_error(err),
            StoreError::Serialize(msg) => {
                tracing::error!(error = %msg, "Row serialization error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },
        PipelineError::UnknownJob(request_id) => (
            StatusCode::NOT_FOUND,
            "UNKNOWN_REQUEST",
            format!("No generation job found for request id '{request_id}'"),
        ),
        PipelineError::CorruptStatus { .. } | PipelineError::InconsistentOutcome => {
            tracing::error!(error = %pipeline, "Pipeline invariant violated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
