//! Notification, email, and comment sinks.
//!
//! Sinks are fire-and-forget collaborators: a sink failure is captured as
//! an action-level failure by the executor, never raised past it.

use async_trait::async_trait;

use flowdesk_core::types::DbId;
use flowdesk_db::models::notification::CreateNotification;
use flowdesk_db::repositories::{NotificationRepo, TicketRepo};
use flowdesk_db::DbPool;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// In-app notification dispatch.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: Option<DbId>,
        ticket_id: Option<DbId>,
        title: &str,
        body: &str,
    ) -> Result<(), StoreError>;
}

/// Outbound email dispatch.
#[async_trait]
pub trait EmailSink: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), StoreError>;
}

/// Ticket comment dispatch.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn add_comment(
        &self,
        ticket_id: DbId,
        author_id: Option<DbId>,
        body: &str,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Postgres-backed sinks
// ---------------------------------------------------------------------------

/// [`NotificationSink`] writing to the `notifications` table.
pub struct PgNotificationSink {
    pool: DbPool,
}

impl PgNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn notify(
        &self,
        user_id: Option<DbId>,
        ticket_id: Option<DbId>,
        title: &str,
        body: &str,
    ) -> Result<(), StoreError> {
        NotificationRepo::create(
            &self.pool,
            &CreateNotification {
                user_id,
                ticket_id,
                title: title.to_string(),
                body: body.to_string(),
            },
        )
        .await?;
        Ok(())
    }
}

/// [`CommentSink`] writing to the `ticket_comments` table.
pub struct PgCommentSink {
    pool: DbPool,
}

impl PgCommentSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentSink for PgCommentSink {
    async fn add_comment(
        &self,
        ticket_id: DbId,
        author_id: Option<DbId>,
        body: &str,
    ) -> Result<(), StoreError> {
        TicketRepo::add_comment(&self.pool, ticket_id, author_id, body).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SMTP email sink
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@flowdesk.local";

/// Configuration for the SMTP email sink.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | —                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@flowdesk.local`  |
    /// | `SMTP_USER`     | no       | —                         |
    /// | `SMTP_PASSWORD` | no       | —                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// [`EmailSink`] sending plain-text mail over async SMTP.
pub struct SmtpEmailSink {
    config: EmailConfig,
}

impl SmtpEmailSink {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmailSink for SmtpEmailSink {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), StoreError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| StoreError::new(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| StoreError::new(format!("Invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| StoreError::new(format!("Email build error: {e}")))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| StoreError::new(format!("SMTP transport error: {e}")))?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer
            .send(email)
            .await
            .map_err(|e| StoreError::new(format!("SMTP send error: {e}")))?;

        tracing::info!(to, subject, "Automation email sent");
        Ok(())
    }
}

/// [`EmailSink`] used when SMTP is not configured; every send fails and is
/// recorded as an action-level failure.
pub struct DisabledEmailSink;

#[async_trait]
impl EmailSink for DisabledEmailSink {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), StoreError> {
        Err(StoreError::new("Email delivery is not configured"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
