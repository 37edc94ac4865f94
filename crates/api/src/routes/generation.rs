//! Route definitions for the `/generations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// GET /{id}  get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(generation::get_by_id))
}
