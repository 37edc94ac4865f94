use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A required upstream artifact is missing (e.g. generating a video
    /// before the shot has a completed image). Caller error; no job is
    /// created when this is returned.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
