//! Route definitions for the `/scenes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{generation, scene, shot};
use crate::state::AppState;

/// Routes mounted at `/scenes`.
///
/// ```text
/// GET    /{id}                      get_by_id
/// PUT    /{id}                      update
/// GET    /{scene_id}/shots          shots list
/// POST   /{scene_id}/shots          shot create
/// POST   /{id}/generate-description trigger text generation
/// GET    /{id}/generations          job history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(scene::get_by_id).put(scene::update))
        .route(
            "/{scene_id}/shots",
            get(shot::list_by_scene).post(shot::create),
        )
        .route(
            "/{id}/generate-description",
            post(generation::generate_scene_description),
        )
        .route("/{id}/generations", get(generation::list_for_scene))
}
