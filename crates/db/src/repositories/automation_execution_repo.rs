//! Repository for the `automation_executions` table (append-only).

use sqlx::PgPool;

use flowdesk_core::types::DbId;

use crate::models::automation_execution::{
    AutomationExecution, CreateAutomationExecution, STATUS_SUCCESS,
};
use crate::models::automation_rule::AutomationRuleStats;

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

const EXECUTION_COLUMNS: &str =
    "id, rule_id, ticket_id, status, executed_by, execution_data, executed_at";

/// Provides insert and read operations for execution records.
///
/// There is deliberately no update or delete: executions are an audit trail.
pub struct AutomationExecutionRepo;

impl AutomationExecutionRepo {
    /// Record an execution.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAutomationExecution,
    ) -> Result<AutomationExecution, sqlx::Error> {
        let query = format!(
            "INSERT INTO automation_executions \
                 (rule_id, ticket_id, status, executed_by, execution_data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {EXECUTION_COLUMNS}"
        );
        sqlx::query_as::<_, AutomationExecution>(&query)
            .bind(input.rule_id)
            .bind(input.ticket_id)
            .bind(&input.status)
            .bind(input.executed_by)
            .bind(&input.execution_data)
            .fetch_one(pool)
            .await
    }

    /// List a rule's executions, newest first.
    pub async fn list_for_rule(
        pool: &PgPool,
        rule_id: DbId,
        limit: i64,
    ) -> Result<Vec<AutomationExecution>, sqlx::Error> {
        let query = format!(
            "SELECT {EXECUTION_COLUMNS} FROM automation_executions \
             WHERE rule_id = $1 ORDER BY executed_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, AutomationExecution>(&query)
            .bind(rule_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Aggregate execution statistics for a rule.
    ///
    /// `success_rate` is successful/total*100 rounded to two decimals, or 0
    /// when the rule never executed.
    pub async fn stats_for_rule(
        pool: &PgPool,
        rule_id: DbId,
    ) -> Result<AutomationRuleStats, sqlx::Error> {
        let (total, successful): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = $2) \
             FROM automation_executions WHERE rule_id = $1",
        )
        .bind(rule_id)
        .bind(STATUS_SUCCESS)
        .fetch_one(pool)
        .await?;

        let success_rate = if total == 0 {
            0.0
        } else {
            (successful as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        Ok(AutomationRuleStats {
            execution_count: total,
            success_rate,
        })
    }
}
