//! Handlers for recurring-ticket rules.
//!
//! Schedule configuration is validated eagerly here, before persisting, so
//! the scheduler never encounters a malformed rule.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use flowdesk_core::schedule::{
    self, resolve_interval, ScheduleConfig, ScheduleType,
};
use flowdesk_core::types::DbId;
use flowdesk_core::{CoreError, Priority};
use flowdesk_db::models::recurring_rule::{
    CreateRecurringRule, RecurringRule, UpdateRecurringRule,
};
use flowdesk_db::repositories::RecurringRuleRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::processes::ensure_process_exists;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for manual rule execution.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRuleRequest {
    pub executed_by: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Verify that a rule exists, returning the full row.
async fn ensure_rule_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<RecurringRule> {
    RecurringRuleRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "RecurringRule", id }))
}

fn validate_max_executions(max_executions: Option<i32>) -> AppResult<()> {
    if let Some(max) = max_executions {
        if max <= 0 {
            return Err(AppError::Core(CoreError::Validation(format!(
                "max_executions must be positive, got {max}"
            ))));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /recurring/rules
// ---------------------------------------------------------------------------

/// Create a new recurring rule.
///
/// The first `next_execution` is resolved with `start_date` taking priority
/// over an explicit `next_execution`; with neither, the rule is first due
/// one interval from now.
pub async fn create_rule(
    State(state): State<AppState>,
    Json(body): Json<CreateRecurringRule>,
) -> AppResult<impl IntoResponse> {
    ScheduleType::from_str(&body.schedule_type)?;

    let config = ScheduleConfig {
        interval_minutes: body.interval_minutes,
        time_of_day: body.time_of_day.clone(),
        day_of_month: body.day_of_month,
        days_of_week: body.days_of_week.clone(),
    };
    schedule::validate_schedule_config(&config)?;

    if let Some(ref timezone) = body.timezone {
        schedule::parse_timezone(timezone)?;
    }
    if let Some(ref priority) = body.template_priority {
        Priority::from_str(priority)?;
    }
    validate_max_executions(body.max_executions)?;

    ensure_process_exists(&state.pool, body.process_id).await?;

    let next_execution = match body.start_date.or(body.next_execution) {
        Some(instant) => instant,
        None => {
            let interval =
                resolve_interval(&config, state.config.recurring_default_interval_minutes);
            schedule::compute_next_execution(interval, Utc::now())?
        }
    };

    let rule = RecurringRuleRepo::create(&state.pool, &body, next_execution).await?;

    tracing::info!(
        rule_id = rule.id,
        process_id = rule.process_id,
        next_execution = %rule.next_execution,
        "Recurring rule created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

// ---------------------------------------------------------------------------
// GET /recurring/rules
// ---------------------------------------------------------------------------

/// List all recurring rules.
pub async fn list_rules(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rules = RecurringRuleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: rules }))
}

// ---------------------------------------------------------------------------
// GET /recurring/rules/{id}
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
// PUT /recurring/rules/{id}
// ---------------------------------------------------------------------------

/// Update an existing rule.
///
/// The schedule is re-validated against the merged (existing + patched)
/// configuration so a partial update cannot leave the rule malformed.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateRecurringRule>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_rule_exists(&state.pool, id).await?;

    if let Some(ref schedule_type) = body.schedule_type {
        ScheduleType::from_str(schedule_type)?;
    }

    let current = existing.schedule_config();
    let merged = ScheduleConfig {
        interval_minutes: body.interval_minutes.or(current.interval_minutes),
        time_of_day: body.time_of_day.clone().or(current.time_of_day),
        day_of_month: body.day_of_month.or(current.day_of_month),
        days_of_week: body.days_of_week.clone().or(current.days_of_week),
    };
    schedule::validate_schedule_config(&merged)?;

    if let Some(ref timezone) = body.timezone {
        schedule::parse_timezone(timezone)?;
    }
    if let Some(ref priority) = body.template_priority {
        Priority::from_str(priority)?;
    }
    validate_max_executions(body.max_executions)?;

    let updated = RecurringRuleRepo::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "RecurringRule", id }))?;

    tracing::info!(rule_id = id, "Recurring rule updated");

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /recurring/rules/{id}
// ---------------------------------------------------------------------------

/// Delete a rule by ID.
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = RecurringRuleRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound { entity: "RecurringRule", id }));
    }

    tracing::info!(rule_id = id, "Recurring rule deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /recurring/rules/due
// ---------------------------------------------------------------------------

/// List rules due right now. Read-only.
pub async fn list_due_rules(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let due = state.recurring.list_due_rules(Utc::now()).await?;
    Ok(Json(DataResponse { data: due }))
}

// ---------------------------------------------------------------------------
// POST /recurring/rules/due/execute
// ---------------------------------------------------------------------------

/// Execute every due rule, returning the aggregate summary.
///
/// Per-rule failures are reported inside the summary; the endpoint itself
/// never fails because of a single rule.
pub async fn execute_due_rules(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = state.recurring.execute_due_rules(Utc::now()).await?;

    tracing::info!(
        executed = summary.executed_count,
        errors = summary.error_count,
        total = summary.total_count,
        "Manual due-rule run finished"
    );

    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// POST /recurring/rules/{id}/execute
// ---------------------------------------------------------------------------

/// Execute one rule immediately.
///
/// This is the same counted path as scheduled execution: it consumes one
/// unit of `max_executions` and advances `next_execution`.
pub async fn execute_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ExecuteRuleRequest>>,
) -> AppResult<impl IntoResponse> {
    let rule = ensure_rule_exists(&state.pool, id).await?;
    let executed_by = body.map(|Json(b)| b.executed_by).unwrap_or_default();

    let outcome = state
        .recurring
        .execute_rule(&rule, Utc::now(), executed_by)
        .await?;

    tracing::info!(
        rule_id = id,
        ticket_id = outcome.ticket.id,
        executed_by = ?executed_by,
        "Recurring rule executed manually"
    );

    Ok(Json(DataResponse { data: outcome }))
}
