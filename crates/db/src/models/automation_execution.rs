//! Automation execution log models and DTOs.
//!
//! Executions are an append-only audit trail: one row per invocation,
//! never mutated after insert.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::types::{DbId, Timestamp};

/// Execution finished with every action succeeding.
pub const STATUS_SUCCESS: &str = "success";
/// At least one action failed.
pub const STATUS_FAILED: &str = "failed";
/// Execution has been recorded but not yet resolved.
pub const STATUS_PENDING: &str = "pending";

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `automation_executions` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AutomationExecution {
    pub id: DbId,
    pub rule_id: DbId,
    pub ticket_id: Option<DbId>,
    pub status: String,
    pub executed_by: Option<DbId>,
    pub execution_data: serde_json::Value,
    pub executed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for recording an execution.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAutomationExecution {
    pub rule_id: DbId,
    pub ticket_id: Option<DbId>,
    pub status: String,
    pub executed_by: Option<DbId>,
    pub execution_data: serde_json::Value,
}
