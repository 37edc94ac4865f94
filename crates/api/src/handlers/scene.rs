//! Handlers for the `/scenes` resource.
//!
//! Scene creation and listing are nested under projects:
//! `/projects/{project_id}/scenes`; individual scenes live at
//! `/scenes/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyreel_core::error::CoreError;
use storyreel_core::types::DbId;
use storyreel_db::models::scene::{CreateScene, Scene, UpdateScene};
use storyreel_db::repositories::SceneRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/projects/{project_id}/scenes
///
/// Overrides `input.project_id` with the value from the URL path.
pub async fn create(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(mut input): Json<CreateScene>,
) -> AppResult<(StatusCode, Json<DataResponse<Scene>>)> {
    input.project_id = project_id;
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let scene = SceneRepo::create(&state.pool, &input).await?;
    tracing::info!(scene_id = scene.id, project_id, "Scene created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: scene })))
}

/// GET /api/projects/{project_id}/scenes
pub async fn list_by_project(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Scene>>>> {
    let scenes = SceneRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: scenes }))
}

/// GET /api/scenes/{id}
pub async fn get_by_id(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Scene>>> {
    let scene = SceneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Scene", id }))?;
    Ok(Json(DataResponse { data: scene }))
}

/// PUT /api/scenes/{id}
pub async fn update(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScene>,
) -> AppResult<Json<DataResponse<Scene>>> {
    let scene = SceneRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Scene", id }))?;
    Ok(Json(DataResponse { data: scene }))
}
