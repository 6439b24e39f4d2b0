//! Automation actions as a closed tagged union.
//!
//! Rules store their action list as a JSON array of
//! `{"type": "...", ...parameters}` objects. Modelling the list as an enum
//! keeps the executor's dispatch exhaustive: adding a variant forces every
//! match site to handle it, and unknown `type` strings are rejected when a
//! rule is created or updated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::priority::Priority;
use crate::types::DbId;

/// One step of an automation rule, executed in array order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SendNotification {
        message: String,
        #[serde(default)]
        user_id: Option<DbId>,
    },
    MoveToStage {
        stage_id: DbId,
        #[serde(default)]
        comment: Option<String>,
    },
    AssignUser {
        user_id: DbId,
    },
    UpdateField {
        field_id: String,
        value: Value,
    },
    CreateTicket {
        title: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        priority: Option<Priority>,
    },
    SendEmail {
        to: String,
        subject: String,
        body: String,
    },
    AddComment {
        body: String,
    },
}

impl Action {
    /// The wire-format discriminator, used in execution outcome records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SendNotification { .. } => "send_notification",
            Self::MoveToStage { .. } => "move_to_stage",
            Self::AssignUser { .. } => "assign_user",
            Self::UpdateField { .. } => "update_field",
            Self::CreateTicket { .. } => "create_ticket",
            Self::SendEmail { .. } => "send_email",
            Self::AddComment { .. } => "add_comment",
        }
    }

    /// Parse a JSON array of actions, as stored on an automation rule.
    pub fn parse_list(value: &Value) -> Result<Vec<Action>, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid action list: {e}")))
    }
}
