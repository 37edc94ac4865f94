//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated request guard for the static API token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(_auth: RequireToken) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
///
/// Webhook routes do not use it; they authenticate via HMAC signatures.
#[derive(Debug, Clone, Copy)]
pub struct RequireToken;

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        if token != state.config.api_token {
            return Err(AppError::Unauthorized("Invalid API token".into()));
        }

        Ok(RequireToken)
    }
}
