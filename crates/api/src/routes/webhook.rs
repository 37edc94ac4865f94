//! Route definitions for inbound provider webhooks.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST /{provider}  receive (HMAC-authenticated)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{provider}", post(webhook::receive))
}
