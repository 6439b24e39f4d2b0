//! Repository for the `tickets` and `ticket_comments` tables.

use sqlx::PgPool;

use flowdesk_core::types::DbId;

use crate::models::ticket::{CreateTicket, Ticket, TicketComment};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const TICKET_COLUMNS: &str = "\
    id, process_id, stage_id, title, description, priority, assignee_id, \
    due_date, data, created_by, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, ticket_id, author_id, body, created_at";

/// Built-in ticket columns addressable through `update_field`.
///
/// Everything else is patched into the `data` JSONB document. The whitelist
/// keeps the column name out of user control.
const TEXT_FIELD_COLUMNS: &[&str] = &["title", "description", "priority"];

/// Provides CRUD operations for tickets and their comments.
pub struct TicketRepo;

impl TicketRepo {
    // -----------------------------------------------------------------------
    // Ticket CRUD
    // -----------------------------------------------------------------------

    /// Create a new ticket.
    pub async fn create(pool: &PgPool, input: &CreateTicket) -> Result<Ticket, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets \
                 (process_id, stage_id, title, description, priority, assignee_id, \
                  due_date, data, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {TICKET_COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(input.process_id)
            .bind(input.stage_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority.as_deref().unwrap_or("medium"))
            .bind(input.assignee_id)
            .bind(input.due_date)
            .bind(
                input
                    .data
                    .clone()
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            )
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a ticket by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a process's tickets, newest first.
    pub async fn list_for_process(
        pool: &PgPool,
        process_id: DbId,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE process_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(process_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Mutations used by the engines
    // -----------------------------------------------------------------------

    /// Move a ticket to another stage of its own process.
    ///
    /// Returns the updated ticket, or `None` when the ticket does not exist
    /// or the target stage belongs to a different process.
    pub async fn move_stage(
        pool: &PgPool,
        ticket_id: DbId,
        stage_id: DbId,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET stage_id = $2, updated_at = NOW() \
             WHERE id = $1 \
               AND EXISTS (SELECT 1 FROM stages s \
                           WHERE s.id = $2 AND s.process_id = tickets.process_id) \
             RETURNING {TICKET_COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(ticket_id)
            .bind(stage_id)
            .fetch_optional(pool)
            .await
    }

    /// Assign a ticket to a user.
    pub async fn assign(
        pool: &PgPool,
        ticket_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET assignee_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {TICKET_COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(ticket_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Update a single ticket field.
    ///
    /// Whitelisted text columns are written directly; any other `field_id`
    /// is patched into the `data` JSONB document under that key.
    pub async fn update_field(
        pool: &PgPool,
        ticket_id: DbId,
        field_id: &str,
        value: &serde_json::Value,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        if let Some(column) = TEXT_FIELD_COLUMNS.iter().find(|c| **c == field_id) {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let query = format!(
                "UPDATE tickets SET {column} = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING {TICKET_COLUMNS}"
            );
            return sqlx::query_as::<_, Ticket>(&query)
                .bind(ticket_id)
                .bind(text)
                .fetch_optional(pool)
                .await;
        }

        let query = format!(
            "UPDATE tickets \
             SET data = jsonb_set(data, ARRAY[$2], $3, true), updated_at = NOW() \
             WHERE id = $1 RETURNING {TICKET_COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(ticket_id)
            .bind(field_id)
            .bind(value)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Append a comment to a ticket.
    pub async fn add_comment(
        pool: &PgPool,
        ticket_id: DbId,
        author_id: Option<DbId>,
        body: &str,
    ) -> Result<TicketComment, sqlx::Error> {
        let query = format!(
            "INSERT INTO ticket_comments (ticket_id, author_id, body) \
             VALUES ($1, $2, $3) RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, TicketComment>(&query)
            .bind(ticket_id)
            .bind(author_id)
            .bind(body)
            .fetch_one(pool)
            .await
    }

    /// List a ticket's comments, oldest first.
    pub async fn list_comments(
        pool: &PgPool,
        ticket_id: DbId,
    ) -> Result<Vec<TicketComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM ticket_comments WHERE ticket_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TicketComment>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
