//! In-memory collaborator doubles for engine unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_db::models::automation_execution::{AutomationExecution, CreateAutomationExecution};
use flowdesk_db::models::automation_rule::AutomationRule;
use flowdesk_db::models::recurring_rule::RecurringRule;
use flowdesk_db::models::ticket::{CreateTicket, Ticket};

use crate::error::StoreError;
use crate::sinks::{CommentSink, EmailSink, NotificationSink};
use crate::store::{ExecutionLog, RecurringRuleStore, TicketStore};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn make_rule(id: DbId, next_execution: Timestamp) -> RecurringRule {
    RecurringRule {
        id,
        name: format!("rule-{id}"),
        description: None,
        process_id: 1,
        template_title: Some(format!("ticket-{id}")),
        template_description: None,
        template_priority: "medium".to_string(),
        template_data: json!({}),
        schedule_type: "custom".to_string(),
        interval_minutes: Some(60),
        time_of_day: None,
        day_of_month: None,
        days_of_week: None,
        timezone: "Asia/Riyadh".to_string(),
        is_active: true,
        next_execution,
        last_executed: None,
        execution_count: 0,
        max_executions: None,
        created_by: None,
        created_at: next_execution,
        updated_at: next_execution,
    }
}

pub fn make_automation_rule(id: DbId, actions: serde_json::Value) -> AutomationRule {
    AutomationRule {
        id,
        name: format!("automation-{id}"),
        description: None,
        process_id: 1,
        trigger_event: "ticket_created".to_string(),
        trigger_stage_id: None,
        trigger_field_id: None,
        trigger_conditions: json!([]),
        actions,
        is_active: true,
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_ticket(id: DbId) -> Ticket {
    Ticket {
        id,
        process_id: 1,
        stage_id: Some(1),
        title: format!("ticket-{id}"),
        description: None,
        priority: "medium".to_string(),
        assignee_id: None,
        due_date: None,
        data: json!({}),
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn ticket_from(input: &CreateTicket, id: DbId) -> Ticket {
    Ticket {
        id,
        process_id: input.process_id,
        stage_id: input.stage_id,
        title: input.title.clone(),
        description: input.description.clone(),
        priority: input
            .priority
            .clone()
            .unwrap_or_else(|| "medium".to_string()),
        assignee_id: input.assignee_id,
        due_date: input.due_date,
        data: input.data.clone().unwrap_or_else(|| json!({})),
        created_by: input.created_by,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MemoryRuleStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRuleStore {
    rules: Mutex<HashMap<DbId, RecurringRule>>,
}

impl MemoryRuleStore {
    pub fn insert(&self, rule: RecurringRule) {
        self.rules.lock().unwrap().insert(rule.id, rule);
    }

    pub fn get(&self, id: DbId) -> Option<RecurringRule> {
        self.rules.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl RecurringRuleStore for MemoryRuleStore {
    async fn list_due(&self, now: Timestamp) -> Result<Vec<RecurringRule>, StoreError> {
        let rules = self.rules.lock().unwrap();
        let mut due: Vec<_> = rules
            .values()
            .filter(|r| r.is_active && r.next_execution <= now)
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.next_execution, r.id));
        Ok(due)
    }

    async fn apply_execution(
        &self,
        id: DbId,
        expected_count: i32,
        executed_at: Timestamp,
        next_execution: Timestamp,
        deactivate: bool,
    ) -> Result<Option<RecurringRule>, StoreError> {
        let mut rules = self.rules.lock().unwrap();
        let Some(rule) = rules.get_mut(&id) else {
            return Ok(None);
        };
        if rule.execution_count != expected_count {
            return Ok(None);
        }
        rule.last_executed = Some(executed_at);
        rule.next_execution = next_execution;
        rule.execution_count += 1;
        if deactivate {
            rule.is_active = false;
        }
        Ok(Some(rule.clone()))
    }

    async fn deactivate(&self, id: DbId) -> Result<(), StoreError> {
        if let Some(rule) = self.rules.lock().unwrap().get_mut(&id) {
            rule.is_active = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryTicketStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryTicketStore {
    created: Mutex<Vec<CreateTicket>>,
    fail_all: bool,
    fail_title: Option<String>,
}

impl MemoryTicketStore {
    /// A store whose every mutation fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    /// A store that rejects only tickets with the given title.
    pub fn failing_for_title(title: &str) -> Self {
        Self {
            fail_title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn last_title(&self) -> Option<String> {
        self.created.lock().unwrap().last().map(|c| c.title.clone())
    }

    pub fn created_by_of_last(&self) -> Option<DbId> {
        self.created.lock().unwrap().last().and_then(|c| c.created_by)
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn create_ticket(&self, input: &CreateTicket) -> Result<Ticket, StoreError> {
        if self.fail_all || self.fail_title.as_deref() == Some(input.title.as_str()) {
            return Err(StoreError::new("ticket store unavailable"));
        }
        let mut created = self.created.lock().unwrap();
        created.push(input.clone());
        Ok(ticket_from(input, created.len() as DbId))
    }

    async fn move_stage(
        &self,
        _ticket_id: DbId,
        stage_id: DbId,
        _comment: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.fail_all {
            return Err(StoreError::new(format!("Invalid stage {stage_id}")));
        }
        Ok(())
    }

    async fn assign(&self, _ticket_id: DbId, _user_id: DbId) -> Result<(), StoreError> {
        if self.fail_all {
            return Err(StoreError::new("ticket store unavailable"));
        }
        Ok(())
    }

    async fn update_field(
        &self,
        _ticket_id: DbId,
        _field_id: &str,
        _value: &serde_json::Value,
    ) -> Result<(), StoreError> {
        if self.fail_all {
            return Err(StoreError::new("ticket store unavailable"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySinks
// ---------------------------------------------------------------------------

/// One struct implementing all three sink traits, with observation helpers.
#[derive(Default)]
pub struct MemorySinks {
    notifications: Mutex<Vec<(Option<DbId>, String)>>,
    emails: Mutex<Vec<(String, String, String)>>,
    comments: Mutex<Vec<(DbId, String)>>,
}

impl MemorySinks {
    pub fn notifications_sent(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    pub fn last_notification_body(&self) -> Option<String> {
        self.notifications
            .lock()
            .unwrap()
            .last()
            .map(|(_, body)| body.clone())
    }

    pub fn comments_added(&self) -> usize {
        self.comments.lock().unwrap().len()
    }

    pub fn emails_sent(&self) -> usize {
        self.emails.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for MemorySinks {
    async fn notify(
        &self,
        user_id: Option<DbId>,
        _ticket_id: Option<DbId>,
        _title: &str,
        body: &str,
    ) -> Result<(), StoreError> {
        self.notifications
            .lock()
            .unwrap()
            .push((user_id, body.to_string()));
        Ok(())
    }
}

#[async_trait]
impl EmailSink for MemorySinks {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), StoreError> {
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

#[async_trait]
impl CommentSink for MemorySinks {
    async fn add_comment(
        &self,
        ticket_id: DbId,
        _author_id: Option<DbId>,
        body: &str,
    ) -> Result<(), StoreError> {
        self.comments
            .lock()
            .unwrap()
            .push((ticket_id, body.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryExecutionLog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryExecutionLog {
    records: Mutex<Vec<AutomationExecution>>,
}

impl MemoryExecutionLog {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionLog for MemoryExecutionLog {
    async fn record(
        &self,
        input: &CreateAutomationExecution,
    ) -> Result<AutomationExecution, StoreError> {
        let mut records = self.records.lock().unwrap();
        let execution = AutomationExecution {
            id: records.len() as DbId + 1,
            rule_id: input.rule_id,
            ticket_id: input.ticket_id,
            status: input.status.clone(),
            executed_by: input.executed_by,
            execution_data: input.execution_data.clone(),
            executed_at: Utc::now(),
        };
        records.push(execution.clone());
        Ok(execution)
    }
}
