//! Recurring rule models and DTOs.
//!
//! A recurring rule owns its scheduling state (`next_execution`,
//! `last_executed`, `execution_count`); the scheduler engine is the only
//! writer of those columns outside the update API.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::schedule::ScheduleConfig;
use flowdesk_core::template::TemplateData;
use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_core::Priority;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `recurring_rules` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub process_id: DbId,
    pub template_title: Option<String>,
    pub template_description: Option<String>,
    pub template_priority: String,
    pub template_data: serde_json::Value,
    pub schedule_type: String,
    pub interval_minutes: Option<i64>,
    pub time_of_day: Option<String>,
    pub day_of_month: Option<i16>,
    pub days_of_week: Option<serde_json::Value>,
    pub timezone: String,
    pub is_active: bool,
    pub next_execution: Timestamp,
    pub last_executed: Option<Timestamp>,
    pub execution_count: i32,
    pub max_executions: Option<i32>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RecurringRule {
    /// The rule's schedule parameters as the core config type.
    pub fn schedule_config(&self) -> ScheduleConfig {
        let days_of_week = self
            .days_of_week
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        ScheduleConfig {
            interval_minutes: self.interval_minutes,
            time_of_day: self.time_of_day.clone(),
            day_of_month: self.day_of_month,
            days_of_week,
        }
    }

    /// The rule's ticket template, or `None` when no title was configured.
    pub fn template(&self) -> Option<TemplateData> {
        let title = self.template_title.clone()?;
        Some(TemplateData {
            title,
            description: self.template_description.clone(),
            priority: Priority::from_str(&self.template_priority).unwrap_or_default(),
            data: self.template_data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a new recurring rule.
///
/// `start_date` takes priority over `next_execution`; when both are absent
/// the first execution is scheduled one interval from now.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecurringRule {
    pub name: String,
    pub description: Option<String>,
    pub process_id: DbId,
    pub template_title: Option<String>,
    pub template_description: Option<String>,
    pub template_priority: Option<String>,
    pub template_data: Option<serde_json::Value>,
    pub schedule_type: String,
    pub interval_minutes: Option<i64>,
    pub time_of_day: Option<String>,
    pub day_of_month: Option<i16>,
    pub days_of_week: Option<Vec<i16>>,
    pub timezone: Option<String>,
    pub start_date: Option<Timestamp>,
    pub next_execution: Option<Timestamp>,
    pub max_executions: Option<i32>,
    pub created_by: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Input for updating an existing rule. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecurringRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub template_title: Option<String>,
    pub template_description: Option<String>,
    pub template_priority: Option<String>,
    pub template_data: Option<serde_json::Value>,
    pub schedule_type: Option<String>,
    pub interval_minutes: Option<i64>,
    pub time_of_day: Option<String>,
    pub day_of_month: Option<i16>,
    pub days_of_week: Option<Vec<i16>>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
    pub next_execution: Option<Timestamp>,
    pub max_executions: Option<i32>,
}
