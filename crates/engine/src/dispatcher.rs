//! Event-to-automation routing engine.
//!
//! [`AutomationDispatcher`] subscribes to the ticket event bus and, for
//! each event, finds the active automation rules of the ticket's process
//! listening for that event type, evaluates their triggers against the
//! ticket's field snapshot, and hands the matches to the action executor.

use std::sync::Arc;

use tokio::sync::broadcast;

use flowdesk_db::repositories::{AutomationRuleRepo, TicketRepo};
use flowdesk_db::DbPool;

use crate::automation::{ticket_field_snapshot, ActionExecutor};
use crate::bus::TicketEvent;

/// Routes ticket events to automation rule executions.
pub struct AutomationDispatcher {
    pool: DbPool,
    executor: Arc<ActionExecutor>,
}

impl AutomationDispatcher {
    /// Create a new dispatcher with the given database pool and executor.
    pub fn new(pool: DbPool, executor: Arc<ActionExecutor>) -> Self {
        Self { pool, executor }
    }

    /// Run the main dispatch loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<TicketEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event = %event.kind,
                            ticket_id = event.ticket_id,
                            "Failed to dispatch ticket event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Automation dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, automation dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Match and execute all rules interested in a single event.
    ///
    /// A rule's execution failure is logged and never stops the remaining
    /// rules; the executor records its own outcome either way.
    async fn handle_event(
        &self,
        event: &TicketEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ticket = match TicketRepo::find_by_id(&self.pool, event.ticket_id).await? {
            Some(ticket) => ticket,
            None => {
                tracing::warn!(ticket_id = event.ticket_id, "Event for unknown ticket, skipping");
                return Ok(());
            }
        };

        let rules =
            AutomationRuleRepo::list_active_for_event(&self.pool, event.process_id, event.kind.as_str())
                .await?;
        if rules.is_empty() {
            return Ok(());
        }

        let snapshot = ticket_field_snapshot(&ticket);

        for rule in &rules {
            let trigger = match rule.trigger() {
                Ok(trigger) => trigger,
                Err(e) => {
                    tracing::warn!(rule_id = rule.id, error = %e, "Skipping rule with invalid trigger");
                    continue;
                }
            };

            if !trigger.matches(event.kind, &snapshot) {
                continue;
            }

            match self
                .executor
                .execute(rule, &ticket, event.actor_user_id)
                .await
            {
                Ok(execution) => {
                    tracing::info!(
                        rule_id = rule.id,
                        ticket_id = ticket.id,
                        execution_id = execution.id,
                        status = %execution.status,
                        "Automation rule executed"
                    );
                }
                Err(e) => {
                    tracing::error!(rule_id = rule.id, error = %e, "Automation rule execution failed");
                }
            }
        }

        Ok(())
    }
}
