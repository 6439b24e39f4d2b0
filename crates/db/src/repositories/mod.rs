//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod automation_execution_repo;
pub mod automation_rule_repo;
pub mod notification_repo;
pub mod process_repo;
pub mod recurring_rule_repo;
pub mod ticket_repo;

pub use automation_execution_repo::AutomationExecutionRepo;
pub use automation_rule_repo::AutomationRuleRepo;
pub use notification_repo::NotificationRepo;
pub use process_repo::ProcessRepo;
pub use recurring_rule_repo::RecurringRuleRepo;
pub use ticket_repo::TicketRepo;
