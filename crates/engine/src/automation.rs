//! Automation action executor.
//!
//! Runs a matched (or manually invoked) rule's action list against a ticket.
//! Execution is best-effort: a failed action never stops later ones, and
//! exactly one execution record is produced per invocation with per-action
//! outcomes captured in `execution_data`.

use std::sync::Arc;

use serde_json::{json, Value};

use flowdesk_core::template::render_tokens;
use flowdesk_core::types::DbId;
use flowdesk_core::Action;
use flowdesk_db::models::automation_execution::{
    AutomationExecution, CreateAutomationExecution, STATUS_FAILED, STATUS_SUCCESS,
};
use flowdesk_db::models::automation_rule::AutomationRule;
use flowdesk_db::models::ticket::{CreateTicket, Ticket};

use crate::error::{EngineError, StoreError};
use crate::sinks::{CommentSink, EmailSink, NotificationSink};
use crate::store::{ExecutionLog, TicketStore};

// ---------------------------------------------------------------------------
// Ticket context helpers
// ---------------------------------------------------------------------------

/// The ticket's field values as seen by trigger conditions.
///
/// Built-in columns and the keys of the `data` document are merged into one
/// flat snapshot; `data` keys shadow built-ins on collision.
pub fn ticket_field_snapshot(ticket: &Ticket) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("title".to_string(), json!(ticket.title));
    fields.insert("description".to_string(), json!(ticket.description));
    fields.insert("priority".to_string(), json!(ticket.priority));
    fields.insert("stage_id".to_string(), json!(ticket.stage_id));
    fields.insert("assignee_id".to_string(), json!(ticket.assignee_id));
    fields.insert(
        "due_date".to_string(),
        json!(ticket.due_date.map(|d| d.to_rfc3339())),
    );
    if let Value::Object(data) = &ticket.data {
        for (key, value) in data {
            fields.insert(key.clone(), value.clone());
        }
    }
    fields
}

/// Dotted-path variables available to action parameter interpolation.
fn ticket_vars(ticket: &Ticket) -> Vec<(&'static str, String)> {
    vec![
        ("ticket.id", ticket.id.to_string()),
        ("ticket.title", ticket.title.clone()),
        (
            "ticket.description",
            ticket.description.clone().unwrap_or_default(),
        ),
        ("ticket.priority", ticket.priority.clone()),
        ("process.id", ticket.process_id.to_string()),
    ]
}

// ---------------------------------------------------------------------------
// ActionExecutor
// ---------------------------------------------------------------------------

/// Executes automation rules against their collaborators.
pub struct ActionExecutor {
    tickets: Arc<dyn TicketStore>,
    notifications: Arc<dyn NotificationSink>,
    email: Arc<dyn EmailSink>,
    comments: Arc<dyn CommentSink>,
    log: Arc<dyn ExecutionLog>,
}

impl ActionExecutor {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        notifications: Arc<dyn NotificationSink>,
        email: Arc<dyn EmailSink>,
        comments: Arc<dyn CommentSink>,
        log: Arc<dyn ExecutionLog>,
    ) -> Self {
        Self {
            tickets,
            notifications,
            email,
            comments,
            log,
        }
    }

    /// Run every action of `rule` against `ticket`, in array order.
    ///
    /// Returns the recorded execution. The record's status is `failed` when
    /// any action failed, but all actions are still attempted. Collaborator
    /// errors are captured per action and never raised past this method;
    /// only a failure to write the execution record itself is an error.
    pub async fn execute(
        &self,
        rule: &AutomationRule,
        ticket: &Ticket,
        triggered_by: Option<DbId>,
    ) -> Result<AutomationExecution, EngineError> {
        let actions = match Action::parse_list(&rule.actions) {
            Ok(actions) => actions,
            Err(e) => {
                // A rule whose stored actions no longer parse still leaves
                // an audit record instead of vanishing silently.
                tracing::error!(rule_id = rule.id, error = %e, "Stored action list is invalid");
                let record = CreateAutomationExecution {
                    rule_id: rule.id,
                    ticket_id: Some(ticket.id),
                    status: STATUS_FAILED.to_string(),
                    executed_by: triggered_by,
                    execution_data: json!({ "error": e.to_string() }),
                };
                return Ok(self.log.record(&record).await?);
            }
        };

        let mut outcomes = Vec::with_capacity(actions.len());
        let mut any_failed = false;

        for action in &actions {
            match self.run_action(action, ticket).await {
                Ok(()) => {
                    outcomes.push(json!({ "action": action.kind(), "status": "success" }));
                }
                Err(e) => {
                    tracing::warn!(
                        rule_id = rule.id,
                        ticket_id = ticket.id,
                        action = action.kind(),
                        error = %e,
                        "Automation action failed"
                    );
                    any_failed = true;
                    outcomes.push(json!({
                        "action": action.kind(),
                        "status": "failed",
                        "error": e.to_string(),
                    }));
                }
            }
        }

        let status = if any_failed { STATUS_FAILED } else { STATUS_SUCCESS };
        let record = CreateAutomationExecution {
            rule_id: rule.id,
            ticket_id: Some(ticket.id),
            status: status.to_string(),
            executed_by: triggered_by,
            execution_data: json!({ "actions": outcomes }),
        };

        Ok(self.log.record(&record).await?)
    }

    async fn run_action(&self, action: &Action, ticket: &Ticket) -> Result<(), StoreError> {
        let vars = ticket_vars(ticket);
        match action {
            Action::SendNotification { message, user_id } => {
                let body = render_tokens(message, &vars);
                self.notifications
                    .notify(*user_id, Some(ticket.id), &ticket.title, &body)
                    .await
            }
            Action::MoveToStage { stage_id, comment } => {
                self.tickets
                    .move_stage(ticket.id, *stage_id, comment.as_deref())
                    .await
            }
            Action::AssignUser { user_id } => self.tickets.assign(ticket.id, *user_id).await,
            Action::UpdateField { field_id, value } => {
                self.tickets.update_field(ticket.id, field_id, value).await
            }
            Action::CreateTicket {
                title,
                description,
                priority,
            } => {
                let input = CreateTicket {
                    process_id: ticket.process_id,
                    stage_id: None,
                    title: render_tokens(title, &vars),
                    description: description.as_deref().map(|d| render_tokens(d, &vars)),
                    priority: priority.map(|p| p.as_str().to_string()),
                    assignee_id: None,
                    due_date: None,
                    data: None,
                    created_by: None,
                };
                self.tickets.create_ticket(&input).await.map(|_| ())
            }
            Action::SendEmail { to, subject, body } => {
                self.email
                    .send(to, &render_tokens(subject, &vars), &render_tokens(body, &vars))
                    .await
            }
            Action::AddComment { body } => {
                self.comments
                    .add_comment(ticket.id, None, &render_tokens(body, &vars))
                    .await
                    .map(|_| ())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
