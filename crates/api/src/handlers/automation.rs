//! Handlers for automation rules.
//!
//! Trigger and action definitions are validated eagerly at create/update
//! time; the dispatcher and executor only ever see well-formed rules.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use flowdesk_core::trigger::{Condition, TriggerEvent};
use flowdesk_core::types::DbId;
use flowdesk_core::{Action, CoreError};
use flowdesk_db::models::automation_rule::{
    AutomationRule, CreateAutomationRule, UpdateAutomationRule,
};
use flowdesk_db::repositories::{AutomationExecutionRepo, AutomationRuleRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::processes::ensure_process_exists;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default and maximum page size for execution history.
const DEFAULT_EXECUTION_LIMIT: i64 = 50;
const MAX_EXECUTION_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for manual rule execution against one ticket.
#[derive(Debug, Deserialize)]
pub struct ExecuteAutomationRequest {
    pub ticket_id: DbId,
    pub executed_by: Option<DbId>,
}

/// Query parameters for listing executions.
#[derive(Debug, Deserialize)]
pub struct ExecutionListQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Verify that a rule exists, returning the full row.
async fn ensure_rule_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<AutomationRule> {
    AutomationRuleRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "AutomationRule", id }))
}

// ---------------------------------------------------------------------------
// POST /automation/rules
// ---------------------------------------------------------------------------

/// Create a new automation rule.
pub async fn create_rule(
    State(state): State<AppState>,
    Json(body): Json<CreateAutomationRule>,
) -> AppResult<impl IntoResponse> {
    TriggerEvent::from_str(&body.trigger_event)?;
    if let Some(ref conditions) = body.trigger_conditions {
        Condition::parse_list(conditions)?;
    }
    Action::parse_list(&body.actions)?;

    ensure_process_exists(&state.pool, body.process_id).await?;

    let rule = AutomationRuleRepo::create(&state.pool, &body).await?;

    tracing::info!(
        rule_id = rule.id,
        process_id = rule.process_id,
        trigger_event = %rule.trigger_event,
        "Automation rule created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

// ---------------------------------------------------------------------------
// GET /automation/rules
// ---------------------------------------------------------------------------

/// List all automation rules.
pub async fn list_rules(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rules = AutomationRuleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: rules }))
}

// ---------------------------------------------------------------------------
// GET /automation/rules/{id}
// ---------------------------------------------------------------------------

/// Get a single rule by ID.
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let rule = ensure_rule_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: rule }))
}

// ---------------------------------------------------------------------------
// PUT /automation/rules/{id}
// ---------------------------------------------------------------------------

/// Update an existing rule.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateAutomationRule>,
) -> AppResult<impl IntoResponse> {
    ensure_rule_exists(&state.pool, id).await?;

    if let Some(ref trigger_event) = body.trigger_event {
        TriggerEvent::from_str(trigger_event)?;
    }
    if let Some(ref conditions) = body.trigger_conditions {
        Condition::parse_list(conditions)?;
    }
    if let Some(ref actions) = body.actions {
        Action::parse_list(actions)?;
    }

    let updated = AutomationRuleRepo::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "AutomationRule", id }))?;

    tracing::info!(rule_id = id, "Automation rule updated");

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /automation/rules/{id}
// ---------------------------------------------------------------------------

/// Delete a rule by ID. Cascade deletes its execution history.
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = AutomationRuleRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound { entity: "AutomationRule", id }));
    }

    tracing::info!(rule_id = id, "Automation rule deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /automation/rules/{id}/executions
// ---------------------------------------------------------------------------

/// Execution history for a rule, newest first.
pub async fn list_executions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<ExecutionListQuery>,
) -> AppResult<impl IntoResponse> {
    ensure_rule_exists(&state.pool, id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_EXECUTION_LIMIT)
        .clamp(1, MAX_EXECUTION_LIMIT);
    let executions = AutomationExecutionRepo::list_for_rule(&state.pool, id, limit).await?;
    Ok(Json(DataResponse { data: executions }))
}

// ---------------------------------------------------------------------------
// GET /automation/rules/{id}/stats
// ---------------------------------------------------------------------------

/// Execution count and success rate for a rule.
pub async fn rule_stats(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_rule_exists(&state.pool, id).await?;

    let stats = AutomationExecutionRepo::stats_for_rule(&state.pool, id).await?;
    Ok(Json(DataResponse { data: stats }))
}

// ---------------------------------------------------------------------------
// POST /automation/rules/{id}/execute
// ---------------------------------------------------------------------------

/// Execute a rule against a ticket immediately.
///
/// Manual execution is an explicit override: the trigger matcher is
/// skipped, every action runs.
pub async fn execute_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ExecuteAutomationRequest>,
) -> AppResult<impl IntoResponse> {
    let rule = ensure_rule_exists(&state.pool, id).await?;

    let ticket = TicketRepo::find_by_id(&state.pool, body.ticket_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound { entity: "Ticket", id: body.ticket_id })
        })?;

    let execution = state
        .executor
        .execute(&rule, &ticket, body.executed_by)
        .await?;

    tracing::info!(
        rule_id = id,
        ticket_id = ticket.id,
        execution_id = execution.id,
        status = %execution.status,
        "Automation rule executed manually"
    );

    Ok(Json(DataResponse { data: execution }))
}
