//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod automation_execution;
pub mod automation_rule;
pub mod notification;
pub mod process;
pub mod recurring_rule;
pub mod ticket;
