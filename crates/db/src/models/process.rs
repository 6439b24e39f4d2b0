//! Process and stage catalog models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flowdesk_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// A row from the `processes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Process {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a new process.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProcess {
    pub name: String,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A row from the `stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stage {
    pub id: DbId,
    pub process_id: DbId,
    pub name: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a new stage within a process.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStage {
    pub name: String,
    pub sort_order: Option<i32>,
}
