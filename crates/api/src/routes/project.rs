//! Route definitions for the `/projects` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::{character, project, scene};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                               list
/// POST   /                               create
/// GET    /{id}                           get_by_id
/// PUT    /{id}                           update
/// GET    /{project_id}/scenes            scenes list
/// POST   /{project_id}/scenes            scene create
/// GET    /{project_id}/characters        characters list
/// POST   /{project_id}/characters        character create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id).put(project::update))
        .route(
            "/{project_id}/scenes",
            get(scene::list_by_project).post(scene::create),
        )
        .route(
            "/{project_id}/characters",
            get(character::list_by_project).post(character::create),
        )
}
