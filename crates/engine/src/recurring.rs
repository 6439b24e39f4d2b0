//! Recurring-ticket scheduler engine.
//!
//! The engine never sleeps and never reads the wall clock: callers pass
//! `now` everywhere, so every behaviour is reproducible in tests. An
//! external poller ([`crate::poller::RecurringPoller`]) or the manual
//! execute API drives it.

use std::sync::Arc;

use serde::Serialize;

use flowdesk_core::schedule::{self, resolve_interval};
use flowdesk_core::template::{self, RenderContext};
use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_db::models::recurring_rule::RecurringRule;
use flowdesk_db::models::ticket::{CreateTicket, Ticket};

use crate::error::EngineError;
use crate::store::{RecurringRuleStore, TicketStore};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The result of one successful rule execution.
#[derive(Debug, Serialize)]
pub struct ExecutionOutcome {
    /// The rule with its advanced scheduling state.
    pub rule: RecurringRule,
    /// The ticket that was created.
    pub ticket: Ticket,
    /// When the rule is due again.
    pub next_execution: Timestamp,
}

/// A single rule's failure within a batch run.
#[derive(Debug, Serialize)]
pub struct RuleFailure {
    pub rule_id: DbId,
    pub error: String,
}

/// Aggregate result of a batch due-rule run.
#[derive(Debug, Serialize)]
pub struct DueRunSummary {
    pub executed_count: usize,
    pub error_count: usize,
    pub total_count: usize,
    pub executed: Vec<ExecutionOutcome>,
    pub failed: Vec<RuleFailure>,
}

// ---------------------------------------------------------------------------
// RecurringEngine
// ---------------------------------------------------------------------------

/// Orchestrates recurring rule execution against the injected collaborators.
pub struct RecurringEngine {
    rules: Arc<dyn RecurringRuleStore>,
    tickets: Arc<dyn TicketStore>,
    default_interval_minutes: i64,
}

impl RecurringEngine {
    pub fn new(
        rules: Arc<dyn RecurringRuleStore>,
        tickets: Arc<dyn TicketStore>,
        default_interval_minutes: i64,
    ) -> Self {
        Self {
            rules,
            tickets,
            default_interval_minutes,
        }
    }

    /// Active rules due at `now`, oldest due first. Read-only.
    pub async fn list_due_rules(&self, now: Timestamp) -> Result<Vec<RecurringRule>, EngineError> {
        Ok(self.rules.list_due(now).await?)
    }

    /// Execute a single rule once.
    ///
    /// Manual execution (`triggered_by` set) follows the identical path,
    /// including consuming one unit of `max_executions`.
    ///
    /// On any failure before the state transition commits, the rule's
    /// scheduling state is untouched: a due rule that failed stays due and
    /// is retried on the next poll.
    pub async fn execute_rule(
        &self,
        rule: &RecurringRule,
        now: Timestamp,
        triggered_by: Option<DbId>,
    ) -> Result<ExecutionOutcome, EngineError> {
        if !rule.is_active {
            return Err(EngineError::RuleInactive(rule.id));
        }

        if let Some(max) = rule.max_executions {
            if rule.execution_count >= max {
                // Deactivate so the rule stops being selected as due.
                if let Err(e) = self.rules.deactivate(rule.id).await {
                    tracing::warn!(rule_id = rule.id, error = %e, "Failed to deactivate exhausted rule");
                }
                return Err(EngineError::ExecutionLimitReached(rule.id));
            }
        }

        let ctx = RenderContext {
            now,
            timezone: schedule::parse_timezone(&rule.timezone).unwrap_or(chrono_tz::UTC),
        };
        let draft = template::render(rule.template().as_ref(), &rule.name, &ctx);

        let input = CreateTicket {
            process_id: rule.process_id,
            stage_id: None,
            title: draft.title,
            description: (!draft.description.is_empty()).then_some(draft.description),
            priority: Some(draft.priority.as_str().to_string()),
            assignee_id: None,
            due_date: None,
            data: Some(draft.data),
            created_by: triggered_by,
        };

        let ticket = self
            .tickets
            .create_ticket(&input)
            .await
            .map_err(|e| EngineError::TicketCreation {
                rule_id: rule.id,
                message: e.to_string(),
            })?;

        let interval = resolve_interval(&rule.schedule_config(), self.default_interval_minutes);
        let next_execution = schedule::compute_next_execution(interval, now)?;
        let deactivate = rule
            .max_executions
            .is_some_and(|max| rule.execution_count + 1 >= max);

        let updated = self
            .rules
            .apply_execution(rule.id, rule.execution_count, now, next_execution, deactivate)
            .await?
            .ok_or(EngineError::ConcurrentExecution(rule.id))?;

        Ok(ExecutionOutcome {
            rule: updated,
            ticket,
            next_execution,
        })
    }

    /// Execute every due rule, isolating per-rule failures.
    ///
    /// One rule's failure never blocks the others; the summary carries both
    /// the successful outcomes and the per-rule errors.
    pub async fn execute_due_rules(&self, now: Timestamp) -> Result<DueRunSummary, EngineError> {
        let due = self.list_due_rules(now).await?;
        let total_count = due.len();

        let mut executed = Vec::new();
        let mut failed = Vec::new();

        for rule in &due {
            match self.execute_rule(rule, now, None).await {
                Ok(outcome) => {
                    tracing::info!(
                        rule_id = rule.id,
                        ticket_id = outcome.ticket.id,
                        next_execution = %outcome.next_execution,
                        "Recurring rule executed"
                    );
                    executed.push(outcome);
                }
                Err(e) => {
                    tracing::error!(rule_id = rule.id, error = %e, "Recurring rule execution failed");
                    failed.push(RuleFailure {
                        rule_id: rule.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(DueRunSummary {
            executed_count: executed.len(),
            error_count: failed.len(),
            total_count,
            executed,
            failed,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
