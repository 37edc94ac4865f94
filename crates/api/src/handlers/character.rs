//! Handlers for the `/characters` resource.
//!
//! Character creation and listing are nested under projects:
//! `/projects/{project_id}/characters`; individual characters live at
//! `/characters/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyreel_core::error::CoreError;
use storyreel_core::types::DbId;
use storyreel_db::models::character::{Character, CreateCharacter, UpdateCharacter};
use storyreel_db::repositories::CharacterRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/projects/{project_id}/characters
///
/// Overrides `input.project_id` with the value from the URL path.
pub async fn create(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(mut input): Json<CreateCharacter>,
) -> AppResult<(StatusCode, Json<DataResponse<Character>>)> {
    input.project_id = project_id;
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let character = CharacterRepo::create(&state.pool, &input).await?;
    tracing::info!(character_id = character.id, project_id, "Character created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: character })))
}

/// GET /api/projects/{project_id}/characters
pub async fn list_by_project(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Character>>>> {
    let characters = CharacterRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: characters }))
}

/// GET /api/characters/{id}
pub async fn get_by_id(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Character>>> {
    let character = CharacterRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id,
        }))?;
    Ok(Json(DataResponse { data: character }))
}

/// PUT /api/characters/{id}
pub async fn update(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCharacter>,
) -> AppResult<Json<DataResponse<Character>>> {
    let character = CharacterRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id,
        }))?;
    Ok(Json(DataResponse { data: character }))
}
