use flowdesk_core::types::DbId;
use flowdesk_core::CoreError;

/// Generic collaborator failure (ticket store, notification sinks).
#[derive(Debug, Clone, thiserror::Error)]
#[error("Store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self(e.to_string())
    }
}

/// Errors surfaced by the scheduling and automation engines.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The rule is deactivated; nothing was mutated.
    #[error("Recurring rule {0} is inactive")]
    RuleInactive(DbId),

    /// The rule already used its whole execution budget. The rule is
    /// deactivated as a side effect so it stops being selected as due.
    #[error("Recurring rule {0} has reached its execution limit")]
    ExecutionLimitReached(DbId),

    /// The ticket store rejected the rendered ticket. Scheduling state is
    /// left untouched so the rule stays due and retries on the next poll.
    #[error("Ticket creation failed for recurring rule {rule_id}: {message}")]
    TicketCreation { rule_id: DbId, message: String },

    /// Another execution of the same rule won the optimistic update race.
    #[error("Recurring rule {0} was executed concurrently")]
    ConcurrentExecution(DbId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
