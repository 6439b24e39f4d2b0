//! Repository for the `notifications` table.

use sqlx::PgPool;

use flowdesk_core::types::DbId;

use crate::models::notification::{CreateNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, ticket_id, title, body, is_read, created_at";

/// Provides insert and read operations for in-app notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, ticket_id, title, body) \
             VALUES ($1, $2, $3, $4) RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.ticket_id)
            .bind(&input.title)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// List notifications attached to a ticket, newest first.
    pub async fn list_for_ticket(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE ticket_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
