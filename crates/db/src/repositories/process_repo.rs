//! Repository for the `processes` and `stages` tables.

use sqlx::PgPool;

use flowdesk_core::types::DbId;

use crate::models::process::{CreateProcess, CreateStage, Process, Stage};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const PROCESS_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";

const STAGE_COLUMNS: &str = "id, process_id, name, sort_order, created_at, updated_at";

/// Provides read/write operations for the process and stage catalog.
pub struct ProcessRepo;

impl ProcessRepo {
    // -----------------------------------------------------------------------
    // Processes
    // -----------------------------------------------------------------------

    /// Create a new process.
    pub async fn create(pool: &PgPool, input: &CreateProcess) -> Result<Process, sqlx::Error> {
        let query = format!(
            "INSERT INTO processes (name, description) VALUES ($1, $2) \
             RETURNING {PROCESS_COLUMNS}"
        );
        sqlx::query_as::<_, Process>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// List all processes, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Process>, sqlx::Error> {
        let query = format!("SELECT {PROCESS_COLUMNS} FROM processes ORDER BY created_at DESC");
        sqlx::query_as::<_, Process>(&query).fetch_all(pool).await
    }

    /// Find a process by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Process>, sqlx::Error> {
        let query = format!("SELECT {PROCESS_COLUMNS} FROM processes WHERE id = $1");
        sqlx::query_as::<_, Process>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    /// Create a new stage within a process.
    pub async fn create_stage(
        pool: &PgPool,
        process_id: DbId,
        input: &CreateStage,
    ) -> Result<Stage, sqlx::Error> {
        let query = format!(
            "INSERT INTO stages (process_id, name, sort_order) VALUES ($1, $2, $3) \
             RETURNING {STAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Stage>(&query)
            .bind(process_id)
            .bind(&input.name)
            .bind(input.sort_order.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// List a process's stages in board order.
    pub async fn list_stages(pool: &PgPool, process_id: DbId) -> Result<Vec<Stage>, sqlx::Error> {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE process_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Stage>(&query)
            .bind(process_id)
            .fetch_all(pool)
            .await
    }

    /// The first stage of a process (lowest sort_order), if any.
    pub async fn first_stage(pool: &PgPool, process_id: DbId) -> Result<Option<Stage>, sqlx::Error> {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE process_id = $1 \
             ORDER BY sort_order, id LIMIT 1"
        );
        sqlx::query_as::<_, Stage>(&query)
            .bind(process_id)
            .fetch_optional(pool)
            .await
    }
}
