//! Flowdesk scheduling and automation engines.
//!
//! This crate provides the orchestration services built on top of
//! `flowdesk-core` and `flowdesk-db`:
//!
//! - [`RecurringEngine`] — finds due recurring rules, renders their ticket
//!   templates, creates tickets, and advances scheduling state.
//! - [`ActionExecutor`] — runs an automation rule's action list against a
//!   ticket and records the outcome as an append-only execution.
//! - [`EventBus`] / [`TicketEvent`] — in-process publish/subscribe hub for
//!   ticket-domain events.
//! - [`AutomationDispatcher`] — background service matching bus events
//!   against automation rules.
//! - [`RecurringPoller`] — periodic due-rule execution loop.
//! - [`store`] / [`sinks`] — collaborator seams with Postgres-backed
//!   implementations.

pub mod automation;
pub mod bus;
pub mod dispatcher;
pub mod error;
pub mod poller;
pub mod recurring;
pub mod sinks;
pub mod store;

#[cfg(test)]
mod testing;

pub use automation::ActionExecutor;
pub use bus::{EventBus, TicketEvent};
pub use dispatcher::AutomationDispatcher;
pub use error::{EngineError, StoreError};
pub use poller::RecurringPoller;
pub use recurring::{DueRunSummary, ExecutionOutcome, RecurringEngine};
