//! Collaborator seams for the engines, with Postgres-backed implementations.
//!
//! The engines only ever talk to these traits. The Postgres implementations
//! delegate to the `flowdesk-db` repositories; tests substitute in-memory
//! doubles.

use async_trait::async_trait;

use flowdesk_core::types::{DbId, Timestamp};
use flowdesk_db::models::automation_execution::{AutomationExecution, CreateAutomationExecution};
use flowdesk_db::models::recurring_rule::RecurringRule;
use flowdesk_db::models::ticket::{CreateTicket, Ticket};
use flowdesk_db::repositories::{
    AutomationExecutionRepo, ProcessRepo, RecurringRuleRepo, TicketRepo,
};
use flowdesk_db::DbPool;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// TicketStore
// ---------------------------------------------------------------------------

/// Ticket mutation operations the engines delegate to.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, input: &CreateTicket) -> Result<Ticket, StoreError>;
    async fn move_stage(
        &self,
        ticket_id: DbId,
        stage_id: DbId,
        comment: Option<&str>,
    ) -> Result<(), StoreError>;
    async fn assign(&self, ticket_id: DbId, user_id: DbId) -> Result<(), StoreError>;
    async fn update_field(
        &self,
        ticket_id: DbId,
        field_id: &str,
        value: &serde_json::Value,
    ) -> Result<(), StoreError>;
}

/// [`TicketStore`] backed by the `tickets` table.
pub struct PgTicketStore {
    pool: DbPool,
}

impl PgTicketStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn create_ticket(&self, input: &CreateTicket) -> Result<Ticket, StoreError> {
        // Tickets created without an explicit stage land in the process's
        // first stage.
        let mut input = input.clone();
        if input.stage_id.is_none() {
            input.stage_id = ProcessRepo::first_stage(&self.pool, input.process_id)
                .await?
                .map(|s| s.id);
        }
        Ok(TicketRepo::create(&self.pool, &input).await?)
    }

    async fn move_stage(
        &self,
        ticket_id: DbId,
        stage_id: DbId,
        comment: Option<&str>,
    ) -> Result<(), StoreError> {
        let moved = TicketRepo::move_stage(&self.pool, ticket_id, stage_id)
            .await?
            .ok_or_else(|| {
                StoreError::new(format!(
                    "Cannot move ticket {ticket_id}: stage {stage_id} is not part of its process"
                ))
            })?;
        if let Some(comment) = comment {
            TicketRepo::add_comment(&self.pool, moved.id, None, comment).await?;
        }
        Ok(())
    }

    async fn assign(&self, ticket_id: DbId, user_id: DbId) -> Result<(), StoreError> {
        TicketRepo::assign(&self.pool, ticket_id, user_id)
            .await?
            .ok_or_else(|| StoreError::new(format!("Ticket {ticket_id} not found")))?;
        Ok(())
    }

    async fn update_field(
        &self,
        ticket_id: DbId,
        field_id: &str,
        value: &serde_json::Value,
    ) -> Result<(), StoreError> {
        TicketRepo::update_field(&self.pool, ticket_id, field_id, value)
            .await?
            .ok_or_else(|| StoreError::new(format!("Ticket {ticket_id} not found")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecurringRuleStore
// ---------------------------------------------------------------------------

/// Scheduling-state operations on recurring rules.
#[async_trait]
pub trait RecurringRuleStore: Send + Sync {
    /// Active rules whose `next_execution` has passed, oldest due first.
    async fn list_due(&self, now: Timestamp) -> Result<Vec<RecurringRule>, StoreError>;

    /// Persist a successful execution's state transition.
    ///
    /// Must apply only when the rule's `execution_count` still equals
    /// `expected_count`, returning `None` otherwise. This compare-and-swap
    /// is the serialization point that keeps concurrent executions of one
    /// rule from both committing.
    async fn apply_execution(
        &self,
        id: DbId,
        expected_count: i32,
        executed_at: Timestamp,
        next_execution: Timestamp,
        deactivate: bool,
    ) -> Result<Option<RecurringRule>, StoreError>;

    /// Deactivate a rule so it is never selected as due again.
    async fn deactivate(&self, id: DbId) -> Result<(), StoreError>;
}

/// [`RecurringRuleStore`] backed by the `recurring_rules` table.
pub struct PgRecurringRuleStore {
    pool: DbPool,
}

impl PgRecurringRuleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecurringRuleStore for PgRecurringRuleStore {
    async fn list_due(&self, now: Timestamp) -> Result<Vec<RecurringRule>, StoreError> {
        Ok(RecurringRuleRepo::list_due(&self.pool, now).await?)
    }

    async fn apply_execution(
        &self,
        id: DbId,
        expected_count: i32,
        executed_at: Timestamp,
        next_execution: Timestamp,
        deactivate: bool,
    ) -> Result<Option<RecurringRule>, StoreError> {
        Ok(RecurringRuleRepo::apply_execution(
            &self.pool,
            id,
            expected_count,
            executed_at,
            next_execution,
            deactivate,
        )
        .await?)
    }

    async fn deactivate(&self, id: DbId) -> Result<(), StoreError> {
        Ok(RecurringRuleRepo::deactivate(&self.pool, id).await?)
    }
}

// ---------------------------------------------------------------------------
// ExecutionLog
// ---------------------------------------------------------------------------

/// Append-only sink for automation execution records.
#[async_trait]
pub trait ExecutionLog: Send + Sync {
    async fn record(
        &self,
        input: &CreateAutomationExecution,
    ) -> Result<AutomationExecution, StoreError>;
}

/// [`ExecutionLog`] backed by the `automation_executions` table.
pub struct PgExecutionLog {
    pool: DbPool,
}

impl PgExecutionLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionLog for PgExecutionLog {
    async fn record(
        &self,
        input: &CreateAutomationExecution,
    ) -> Result<AutomationExecution, StoreError> {
        Ok(AutomationExecutionRepo::create(&self.pool, input).await?)
    }
}
