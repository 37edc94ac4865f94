//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyreel_core::error::CoreError;
use storyreel_core::types::DbId;
use storyreel_db::models::project::{CreateProject, Project, UpdateProject};
use storyreel_db::repositories::ProjectRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::RequireToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/projects
pub async fn create(
    _auth: RequireToken,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/projects
pub async fn list(
    _auth: RequireToken,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/projects/{id}
pub async fn update(
    _auth: RequireToken,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}
