use std::sync::Arc;

use flowdesk_engine::store::TicketStore;
use flowdesk_engine::{ActionExecutor, EventBus, RecurringEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: flowdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing ticket events.
    pub event_bus: Arc<EventBus>,
    /// Recurring-ticket scheduler engine.
    pub recurring: Arc<RecurringEngine>,
    /// Automation action executor (manual execution endpoint).
    pub executor: Arc<ActionExecutor>,
    /// Ticket store shared with the engines.
    pub tickets: Arc<dyn TicketStore>,
}
