//! Repository for the `automation_rules` table.

use sqlx::PgPool;

use flowdesk_core::types::DbId;

use crate::models::automation_rule::{
    AutomationRule, CreateAutomationRule, UpdateAutomationRule,
};

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

const RULE_COLUMNS: &str = "\
    id, name, description, process_id, trigger_event, trigger_stage_id, \
    trigger_field_id, trigger_conditions, actions, is_active, created_by, \
    created_at, updated_at";

/// Provides CRUD operations for automation rules.
pub struct AutomationRuleRepo;

impl AutomationRuleRepo {
    /// Create a new rule.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAutomationRule,
    ) -> Result<AutomationRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO automation_rules \
                 (name, description, process_id, trigger_event, trigger_stage_id, \
                  trigger_field_id, trigger_conditions, actions, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.process_id)
            .bind(&input.trigger_event)
            .bind(input.trigger_stage_id)
            .bind(&input.trigger_field_id)
            .bind(
                input
                    .trigger_conditions
                    .clone()
                    .unwrap_or_else(|| serde_json::json!([])),
            )
            .bind(&input.actions)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// List all rules, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<AutomationRule>, sqlx::Error> {
        let query =
            format!("SELECT {RULE_COLUMNS} FROM automation_rules ORDER BY created_at DESC");
        sqlx::query_as::<_, AutomationRule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a rule by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AutomationRule>, sqlx::Error> {
        let query = format!("SELECT {RULE_COLUMNS} FROM automation_rules WHERE id = $1");
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active rules of a process listening for a given event type.
    pub async fn list_active_for_event(
        pool: &PgPool,
        process_id: DbId,
        trigger_event: &str,
    ) -> Result<Vec<AutomationRule>, sqlx::Error> {
        let query = format!(
            "SELECT {RULE_COLUMNS} FROM automation_rules \
             WHERE is_active AND process_id = $1 AND trigger_event = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(process_id)
            .bind(trigger_event)
            .fetch_all(pool)
            .await
    }

    /// Update a rule's settings.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAutomationRule,
    ) -> Result<Option<AutomationRule>, sqlx::Error> {
        let query = format!(
            "UPDATE automation_rules SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 trigger_event = COALESCE($4, trigger_event), \
                 trigger_stage_id = COALESCE($5, trigger_stage_id), \
                 trigger_field_id = COALESCE($6, trigger_field_id), \
                 trigger_conditions = COALESCE($7, trigger_conditions), \
                 actions = COALESCE($8, actions), \
                 is_active = COALESCE($9, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.trigger_event)
            .bind(input.trigger_stage_id)
            .bind(&input.trigger_field_id)
            .bind(&input.trigger_conditions)
            .bind(&input.actions)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a rule by ID. Cascade deletes its executions.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM automation_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
