//! Route definitions for automation rules.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::automation;
use crate::state::AppState;

/// Automation rule routes mounted at `/automation`.
///
/// ```text
/// GET    /rules                     -> list_rules
/// POST   /rules                     -> create_rule
/// GET    /rules/{id}                -> get_rule
/// PUT    /rules/{id}                -> update_rule
/// DELETE /rules/{id}                -> delete_rule
/// GET    /rules/{id}/executions     -> list_executions
/// GET    /rules/{id}/stats          -> rule_stats
/// POST   /rules/{id}/execute        -> execute_rule
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rules", get(automation::list_rules).post(automation::create_rule))
        .route(
            "/rules/{id}",
            get(automation::get_rule)
                .put(automation::update_rule)
                .delete(automation::delete_rule),
        )
        .route("/rules/{id}/executions", get(automation::list_executions))
        .route("/rules/{id}/stats", get(automation::rule_stats))
        .route("/rules/{id}/execute", post(automation::execute_rule))
}
