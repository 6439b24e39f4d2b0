//! In-app notification models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub ticket_id: Option<DbId>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// Input for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub user_id: Option<DbId>,
    pub ticket_id: Option<DbId>,
    pub title: String,
    pub body: String,
}
