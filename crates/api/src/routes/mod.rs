pub mod character;
pub mod generation;
pub mod health;
pub mod project;
pub mod scene;
pub mod shot;
pub mod webhook;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                    change feed WebSocket
///
/// /projects                              list, create
/// /projects/{id}                         get, update
/// /projects/{project_id}/scenes          list, create
/// /projects/{project_id}/characters      list, create
///
/// /scenes/{id}                           get, update
/// /scenes/{scene_id}/shots               list, create
/// /scenes/{id}/generate-description      trigger text generation (POST)
/// /scenes/{id}/generations               job history (GET)
///
/// /shots/{id}                            get, update
/// /shots/{id}/generate-image             trigger image generation (POST)
/// /shots/{id}/generate-video             trigger video generation (POST)
/// /shots/{id}/generations                job history (GET)
///
/// /characters/{id}                       get, update
/// /characters/{id}/generate-portrait     trigger portrait generation (POST)
/// /characters/{id}/generations           job history (GET)
///
/// /generations/{id}                      get one job (GET)
///
/// /webhooks/{provider}                   provider completion notices (POST)
/// ```
///
/// All routes except `/webhooks/{provider}` require the bearer API token;
/// webhooks authenticate via HMAC body signatures instead.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Change feed WebSocket.
        .route("/ws", get(ws::ws_handler))
        // Project CRUD (also nests scene and character creation/listing).
        .nest("/projects", project::router())
        // Scene access, shot nesting, and description generation.
        .nest("/scenes", scene::router())
        // Shot access and image/video generation.
        .nest("/shots", shot::router())
        // Character access and portrait generation.
        .nest("/characters", character::router())
        // Generation job lookup.
        .nest("/generations", generation::router())
        // Inbound provider webhooks (HMAC-authenticated).
        .nest("/webhooks", webhook::router())
}
