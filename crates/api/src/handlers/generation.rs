//! Generation trigger and job history handlers.
//!
//! Each trigger endpoint maps its path onto a [`GenerationTarget`] and
//! delegates to the shared orchestrator. The accepted job row is returned
//! immediately; progress arrives over the WebSocket change feed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storyreel_core::error::CoreError;
use storyreel_core::target::GenerationTarget;
use storyreel_core::types::DbId;
use storyreel_db::models::generation::{Generation, GenerationListQuery, TriggerGenerationRequest};
use storyreel_db::repositories::GenerationRepo;
use storyreel_pipeline::GenerationOptions;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/shots/{id}/generate-image
pub async fn generate_shot_image(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TriggerGenerationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Generation>>)> {
    trigger(state, GenerationTarget::ShotImage(id), body).await
}

/// POST /api/shots/{id}/generate-video
pub async fn generate_shot_video(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TriggerGenerationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Generation>>)> {
    trigger(state, GenerationTarget::ShotVideo(id), body).await
}

/// POST /api/characters/{id}/generate-portrait
pub async fn generate_character_portrait(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TriggerGenerationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Generation>>)> {
    trigger(state, GenerationTarget::CharacterPortrait(id), body).await
}

/// POST /api/scenes/{id}/generate-description
pub async fn generate_scene_description(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TriggerGenerationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Generation>>)> {
    trigger(state, GenerationTarget::SceneDescription(id), body).await
}

/// Start the generation and kick off the polling loop for the accepted
/// submission. The 201 body is the job row as created, so the client
/// learns the job id and provider request id in one round trip.
async fn trigger(
    state: AppState,
    target: GenerationTarget,
    body: TriggerGenerationRequest,
) -> AppResult<(StatusCode, Json<DataResponse<Generation>>)> {
    let job = state
        .orchestrator
        .start_generation(target, GenerationOptions::from(body))
        .await?;

    if let Some(request_id) = job.external_request_id.clone() {
        state.orchestrator.spawn_poll(target, request_id);
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// GET /api/shots/{id}/generations
pub async fn list_for_shot(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<GenerationListQuery>,
) -> AppResult<Json<DataResponse<Vec<Generation>>>> {
    list_for_target(state, GenerationTarget::ShotImage(id), params).await
}

/// GET /api/scenes/{id}/generations
pub async fn list_for_scene(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<GenerationListQuery>,
) -> AppResult<Json<DataResponse<Vec<Generation>>>> {
    list_for_target(state, GenerationTarget::SceneDescription(id), params).await
}

/// GET /api/characters/{id}/generations
pub async fn list_for_character(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<GenerationListQuery>,
) -> AppResult<Json<DataResponse<Vec<Generation>>>> {
    list_for_target(state, GenerationTarget::CharacterPortrait(id), params).await
}

/// History is keyed by owner entity, so any target for that entity works;
/// the optional `kind` query filter narrows to one column group.
async fn list_for_target(
    state: AppState,
    target: GenerationTarget,
    params: GenerationListQuery,
) -> AppResult<Json<DataResponse<Vec<Generation>>>> {
    let jobs = GenerationRepo::list_for_entity(
        &state.pool,
        target.entity_type().as_str(),
        target.entity_id(),
        &params,
    )
    .await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/generations/{id}
pub async fn get_by_id(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Generation>>> {
    let job = GenerationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Generation",
            id,
        }))?;
    Ok(Json(DataResponse { data: job }))
}
