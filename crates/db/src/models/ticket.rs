//! Ticket and ticket comment models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DbId,
    pub process_id: DbId,
    pub stage_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<Timestamp>,
    pub data: serde_json::Value,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a new ticket.
///
/// `stage_id` may be omitted; the store then places the ticket in the
/// process's first stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub process_id: DbId,
    pub stage_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<Timestamp>,
    pub data: Option<serde_json::Value>,
    pub created_by: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A row from the `ticket_comments` table (append-only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketComment {
    pub id: DbId,
    pub ticket_id: DbId,
    pub author_id: Option<DbId>,
    pub body: String,
    pub created_at: Timestamp,
}
