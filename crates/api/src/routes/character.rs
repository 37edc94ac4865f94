//! Route definitions for the `/characters` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{character, generation};
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// GET    /{id}                    get_by_id
/// PUT    /{id}                    update
/// POST   /{id}/generate-portrait  trigger portrait generation
/// GET    /{id}/generations        job history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(character::get_by_id).put(character::update))
        .route(
            "/{id}/generate-portrait",
            post(generation::generate_character_portrait),
        )
        .route("/{id}/generations", get(generation::list_for_character))
}
