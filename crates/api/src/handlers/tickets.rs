//! Ticket mutation handlers.
//!
//! These endpoints are the event sources of the automation engine: every
//! mutation publishes the corresponding [`TicketEvent`] to the bus, where
//! the dispatcher matches it against automation rules.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use flowdesk_core::types::DbId;
use flowdesk_core::{CoreError, TriggerEvent};
use flowdesk_db::models::ticket::{CreateTicket, Ticket};
use flowdesk_db::repositories::TicketRepo;
use flowdesk_engine::{EngineError, TicketEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::processes::ensure_process_exists;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for moving a ticket to another stage.
#[derive(Debug, Deserialize)]
pub struct MoveTicketRequest {
    pub stage_id: DbId,
    pub comment: Option<String>,
    pub actor_user_id: Option<DbId>,
}

/// Request body for assigning a ticket.
#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub user_id: DbId,
    pub actor_user_id: Option<DbId>,
}

/// Request body for updating a single ticket field.
#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub field_id: String,
    pub value: serde_json::Value,
    pub actor_user_id: Option<DbId>,
}

/// Request body for adding a comment.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
    pub author_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Verify that a ticket exists, returning the full row.
async fn ensure_ticket_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Ticket> {
    TicketRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Ticket", id }))
}

fn publish(state: &AppState, mut event: TicketEvent, actor: Option<DbId>) {
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    state.event_bus.publish(event);
}

// ---------------------------------------------------------------------------
// POST /tickets
// ---------------------------------------------------------------------------

/// Create a ticket and publish `ticket_created`.
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(body): Json<CreateTicket>,
) -> AppResult<impl IntoResponse> {
    ensure_process_exists(&state.pool, body.process_id).await?;

    let ticket = state
        .tickets
        .create_ticket(&body)
        .await
        .map_err(EngineError::from)?;

    tracing::info!(ticket_id = ticket.id, process_id = ticket.process_id, "Ticket created");

    publish(
        &state,
        TicketEvent::new(TriggerEvent::TicketCreated, ticket.id, ticket.process_id),
        body.created_by,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

// ---------------------------------------------------------------------------
// GET /tickets/{id}
// ---------------------------------------------------------------------------

/// Get a single ticket by ID.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ticket = ensure_ticket_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: ticket }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/move
// ---------------------------------------------------------------------------

/// Move a ticket to another stage and publish `stage_changed`.
pub async fn move_ticket(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<MoveTicketRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_ticket_exists(&state.pool, id).await?;

    state
        .tickets
        .move_stage(id, body.stage_id, body.comment.as_deref())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let ticket = ensure_ticket_exists(&state.pool, id).await?;

    tracing::info!(ticket_id = id, stage_id = body.stage_id, "Ticket moved");

    publish(
        &state,
        TicketEvent::new(TriggerEvent::StageChanged, id, ticket.process_id)
            .with_stage(body.stage_id),
        body.actor_user_id,
    );

    Ok(Json(DataResponse { data: ticket }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/assign
// ---------------------------------------------------------------------------

/// Assign a ticket to a user and publish `ticket_assigned`.
pub async fn assign_ticket(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<AssignTicketRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_ticket_exists(&state.pool, id).await?;

    state
        .tickets
        .assign(id, body.user_id)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let ticket = ensure_ticket_exists(&state.pool, id).await?;

    publish(
        &state,
        TicketEvent::new(TriggerEvent::TicketAssigned, id, ticket.process_id),
        body.actor_user_id,
    );

    Ok(Json(DataResponse { data: ticket }))
}

// ---------------------------------------------------------------------------
// PATCH /tickets/{id}/fields
// ---------------------------------------------------------------------------

/// Update one ticket field and publish `field_updated`.
pub async fn update_ticket_field(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateFieldRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_ticket_exists(&state.pool, id).await?;

    state
        .tickets
        .update_field(id, &body.field_id, &body.value)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let ticket = ensure_ticket_exists(&state.pool, id).await?;

    publish(
        &state,
        TicketEvent::new(TriggerEvent::FieldUpdated, id, ticket.process_id)
            .with_field(body.field_id.clone()),
        body.actor_user_id,
    );

    Ok(Json(DataResponse { data: ticket }))
}

// ---------------------------------------------------------------------------
// POST /tickets/{id}/comments
// ---------------------------------------------------------------------------

/// Append a comment and publish `comment_added`.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<AddCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let ticket = ensure_ticket_exists(&state.pool, id).await?;

    let comment = TicketRepo::add_comment(&state.pool, id, body.author_id, &body.body).await?;

    publish(
        &state,
        TicketEvent::new(TriggerEvent::CommentAdded, id, ticket.process_id),
        body.author_id,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

// ---------------------------------------------------------------------------
// GET /tickets/{id}/comments
// ---------------------------------------------------------------------------

/// List a ticket's comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_ticket_exists(&state.pool, id).await?;

    let comments = TicketRepo::list_comments(&state.pool, id).await?;
    Ok(Json(DataResponse { data: comments }))
}
