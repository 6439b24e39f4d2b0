//! Repository for the `recurring_rules` table.

use sqlx::PgPool;

use flowdesk_core::types::{DbId, Timestamp};

use crate::models::recurring_rule::{CreateRecurringRule, RecurringRule, UpdateRecurringRule};

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

const RULE_COLUMNS: &str = "\
    id, name, description, process_id, template_title, template_description, \
    template_priority, template_data, schedule_type, interval_minutes, \
    time_of_day, day_of_month, days_of_week, timezone, is_active, \
    next_execution, last_executed, execution_count, max_executions, \
    created_by, created_at, updated_at";

/// Provides CRUD and scheduling-state operations for recurring rules.
pub struct RecurringRuleRepo;

impl RecurringRuleRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Create a new rule with a resolved `next_execution`.
    ///
    /// The caller resolves start-date/interval precedence before insert so
    /// the column is always populated.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRecurringRule,
        next_execution: Timestamp,
    ) -> Result<RecurringRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO recurring_rules \
                 (name, description, process_id, template_title, template_description, \
                  template_priority, template_data, schedule_type, interval_minutes, \
                  time_of_day, day_of_month, days_of_week, timezone, next_execution, \
                  max_executions, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, RecurringRule>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.process_id)
            .bind(&input.template_title)
            .bind(&input.template_description)
            .bind(input.template_priority.as_deref().unwrap_or("medium"))
            .bind(
                input
                    .template_data
                    .clone()
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            )
            .bind(&input.schedule_type)
            .bind(input.interval_minutes)
            .bind(&input.time_of_day)
            .bind(input.day_of_month)
            .bind(
                input
                    .days_of_week
                    .as_ref()
                    .map(|d| serde_json::json!(d)),
            )
            .bind(
                input
                    .timezone
                    .as_deref()
                    .unwrap_or(flowdesk_core::schedule::DEFAULT_TIMEZONE),
            )
            .bind(next_execution)
            .bind(input.max_executions)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// List all rules, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<RecurringRule>, sqlx::Error> {
        let query =
            format!("SELECT {RULE_COLUMNS} FROM recurring_rules ORDER BY created_at DESC");
        sqlx::query_as::<_, RecurringRule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a rule by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RecurringRule>, sqlx::Error> {
        let query = format!("SELECT {RULE_COLUMNS} FROM recurring_rules WHERE id = $1");
        sqlx::query_as::<_, RecurringRule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a rule's settings.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRecurringRule,
    ) -> Result<Option<RecurringRule>, sqlx::Error> {
        let query = format!(
            "UPDATE recurring_rules SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 template_title = COALESCE($4, template_title), \
                 template_description = COALESCE($5, template_description), \
                 template_priority = COALESCE($6, template_priority), \
                 template_data = COALESCE($7, template_data), \
                 schedule_type = COALESCE($8, schedule_type), \
                 interval_minutes = COALESCE($9, interval_minutes), \
                 time_of_day = COALESCE($10, time_of_day), \
                 day_of_month = COALESCE($11, day_of_month), \
                 days_of_week = COALESCE($12, days_of_week), \
                 timezone = COALESCE($13, timezone), \
                 is_active = COALESCE($14, is_active), \
                 next_execution = COALESCE($15, next_execution), \
                 max_executions = COALESCE($16, max_executions), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, RecurringRule>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.template_title)
            .bind(&input.template_description)
            .bind(&input.template_priority)
            .bind(&input.template_data)
            .bind(&input.schedule_type)
            .bind(input.interval_minutes)
            .bind(&input.time_of_day)
            .bind(input.day_of_month)
            .bind(input.days_of_week.as_ref().map(|d| serde_json::json!(d)))
            .bind(&input.timezone)
            .bind(input.is_active)
            .bind(input.next_execution)
            .bind(input.max_executions)
            .fetch_optional(pool)
            .await
    }

    /// Delete a rule by ID.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recurring_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Scheduling state
    // -----------------------------------------------------------------------

    /// List active rules whose `next_execution` has passed, oldest due first.
    pub async fn list_due(pool: &PgPool, now: Timestamp) -> Result<Vec<RecurringRule>, sqlx::Error> {
        let query = format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rules \
             WHERE is_active AND next_execution <= $1 \
             ORDER BY next_execution ASC"
        );
        sqlx::query_as::<_, RecurringRule>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Record a successful execution.
    ///
    /// The `WHERE execution_count = $2` clause is an optimistic guard: when
    /// a concurrent execution of the same rule already advanced the counter,
    /// no row matches and `None` is returned, so only one of the racers
    /// commits its state transition.
    pub async fn apply_execution(
        pool: &PgPool,
        id: DbId,
        expected_count: i32,
        executed_at: Timestamp,
        next_execution: Timestamp,
        deactivate: bool,
    ) -> Result<Option<RecurringRule>, sqlx::Error> {
        let query = format!(
            "UPDATE recurring_rules SET \
                 last_executed = $3, \
                 next_execution = $4, \
                 execution_count = execution_count + 1, \
                 is_active = is_active AND NOT $5, \
                 updated_at = NOW() \
             WHERE id = $1 AND execution_count = $2 \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, RecurringRule>(&query)
            .bind(id)
            .bind(expected_count)
            .bind(executed_at)
            .bind(next_execution)
            .bind(deactivate)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a rule so it is never selected as due again.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE recurring_rules SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
