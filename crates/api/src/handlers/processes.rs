//! Handlers for the process/stage catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use flowdesk_core::types::DbId;
use flowdesk_core::CoreError;
use flowdesk_db::models::process::{CreateProcess, CreateStage, Process};
use flowdesk_db::repositories::{ProcessRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Verify that a process exists, returning the full row.
pub(crate) async fn ensure_process_exists(
    pool: &sqlx::PgPool,
    id: DbId,
) -> AppResult<Process> {
    ProcessRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Process", id }))
}

/// Create a new process.
pub async fn create_process(
    State(state): State<AppState>,
    Json(body): Json<CreateProcess>,
) -> AppResult<impl IntoResponse> {
    if body.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Process name must not be empty".to_string(),
        )));
    }

    let process = ProcessRepo::create(&state.pool, &body).await?;
    tracing::info!(process_id = process.id, "Process created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: process })))
}

/// List all processes.
pub async fn list_processes(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let processes = ProcessRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: processes }))
}

/// Get a single process by ID.
pub async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let process = ensure_process_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: process }))
}

/// Create a new stage within a process.
pub async fn create_stage(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<CreateStage>,
) -> AppResult<impl IntoResponse> {
    ensure_process_exists(&state.pool, id).await?;

    let stage = ProcessRepo::create_stage(&state.pool, id, &body).await?;
    tracing::info!(process_id = id, stage_id = stage.id, "Stage created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: stage })))
}

/// List a process's stages in board order.
pub async fn list_stages(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_process_exists(&state.pool, id).await?;

    let stages = ProcessRepo::list_stages(&state.pool, id).await?;
    Ok(Json(DataResponse { data: stages }))
}

/// List a process's tickets, newest first.
pub async fn list_tickets(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_process_exists(&state.pool, id).await?;

    let tickets = TicketRepo::list_for_process(&state.pool, id).await?;
    Ok(Json(DataResponse { data: tickets }))
}
