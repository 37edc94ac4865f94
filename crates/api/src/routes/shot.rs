//! Route definitions for the `/shots` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{generation, shot};
use crate::state::AppState;

/// Routes mounted at `/shots`.
///
/// ```text
/// GET    /{id}                 get_by_id
/// PUT    /{id}                 update
/// POST   /{id}/generate-image  trigger image generation
/// POST   /{id}/generate-video  trigger video generation
/// GET    /{id}/generations     job history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(shot::get_by_id).put(shot::update))
        .route(
            "/{id}/generate-image",
            post(generation::generate_shot_image),
        )
        .route(
            "/{id}/generate-video",
            post(generation::generate_shot_video),
        )
        .route("/{id}/generations", get(generation::list_for_shot))
}
