//! Route definitions for recurring-ticket rules.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::recurring;
use crate::state::AppState;

/// Recurring rule routes mounted at `/recurring`.
///
/// ```text
/// GET    /rules                  -> list_rules
/// POST   /rules                  -> create_rule
/// GET    /rules/due              -> list_due_rules
/// POST   /rules/due/execute      -> execute_due_rules
/// GET    /rules/{id}             -> get_rule
/// PUT    /rules/{id}             -> update_rule
/// DELETE /rules/{id}             -> delete_rule
/// POST   /rules/{id}/execute     -> execute_rule
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rules", get(recurring::list_rules).post(recurring::create_rule))
        .route("/rules/due", get(recurring::list_due_rules))
        .route("/rules/due/execute", post(recurring::execute_due_rules))
        .route(
            "/rules/{id}",
            get(recurring::get_rule)
                .put(recurring::update_rule)
                .delete(recurring::delete_rule),
        )
        .route("/rules/{id}/execute", post(recurring::execute_rule))
}
