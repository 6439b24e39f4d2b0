//! Automation rule models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::trigger::{Condition, Trigger, TriggerEvent};
use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_core::CoreError;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `automation_rules` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub process_id: DbId,
    pub trigger_event: String,
    pub trigger_stage_id: Option<DbId>,
    pub trigger_field_id: Option<String>,
    pub trigger_conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub is_active: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AutomationRule {
    /// The rule's trigger definition as the core type.
    pub fn trigger(&self) -> Result<Trigger, CoreError> {
        Ok(Trigger {
            event: TriggerEvent::from_str(&self.trigger_event)?,
            stage_id: self.trigger_stage_id,
            field_id: self.trigger_field_id.clone(),
            conditions: Condition::parse_list(&self.trigger_conditions)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Create / update DTOs
// ---------------------------------------------------------------------------

/// Input for creating a new automation rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAutomationRule {
    pub name: String,
    pub description: Option<String>,
    pub process_id: DbId,
    pub trigger_event: String,
    pub trigger_stage_id: Option<DbId>,
    pub trigger_field_id: Option<String>,
    pub trigger_conditions: Option<serde_json::Value>,
    pub actions: serde_json::Value,
    pub created_by: Option<DbId>,
}

/// Input for updating an existing rule. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAutomationRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger_event: Option<String>,
    pub trigger_stage_id: Option<DbId>,
    pub trigger_field_id: Option<String>,
    pub trigger_conditions: Option<serde_json::Value>,
    pub actions: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Derived statistics (computed, not a DB row)
// ---------------------------------------------------------------------------

/// Execution statistics for a rule, aggregated from its execution log.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationRuleStats {
    pub execution_count: i64,
    pub success_rate: f64,
}
