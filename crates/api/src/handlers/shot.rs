//! Handlers for the `/shots` resource.
//!
//! Shot creation and listing are nested under scenes:
//! `/scenes/{scene_id}/shots`; individual shots live at `/shots/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyreel_core::error::CoreError;
use storyreel_core::types::DbId;
use storyreel_db::models::shot::{CreateShot, Shot, UpdateShot};
use storyreel_db::repositories::ShotRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/scenes/{scene_id}/shots
///
/// Overrides `input.scene_id` with the value from the URL path.
pub async fn create(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(scene_id): Path<DbId>,
    Json(mut input): Json<CreateShot>,
) -> AppResult<(StatusCode, Json<DataResponse<Shot>>)> {
    input.scene_id = scene_id;
    let shot = ShotRepo::create(&state.pool, &input).await?;
    tracing::info!(shot_id = shot.id, scene_id, "Shot created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: shot })))
}

/// GET /api/scenes/{scene_id}/shots
pub async fn list_by_scene(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(scene_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Shot>>>> {
    let shots = ShotRepo::list_by_scene(&state.pool, scene_id).await?;
    Ok(Json(DataResponse { data: shots }))
}

/// GET /api/shots/{id}
pub async fn get_by_id(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Shot>>> {
    let shot = ShotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Shot", id }))?;
    Ok(Json(DataResponse { data: shot }))
}

/// PUT /api/shots/{id}
pub async fn update(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateShot>,
) -> AppResult<Json<DataResponse<Shot>>> {
    let shot = ShotRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Shot", id }))?;
    Ok(Json(DataResponse { data: shot }))
}
