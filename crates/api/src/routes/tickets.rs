//! Route definitions for ticket mutations (automation event sources).

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::tickets;
use crate::state::AppState;

/// Ticket routes mounted at `/tickets`.
///
/// ```text
/// POST  /                  -> create_ticket
/// GET   /{id}              -> get_ticket
/// POST  /{id}/move         -> move_ticket
/// POST  /{id}/assign       -> assign_ticket
/// PATCH /{id}/fields       -> update_ticket_field
/// GET   /{id}/comments     -> list_comments
/// POST  /{id}/comments     -> add_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tickets::create_ticket))
        .route("/{id}", get(tickets::get_ticket))
        .route("/{id}/move", post(tickets::move_ticket))
        .route("/{id}/assign", post(tickets::assign_ticket))
        .route("/{id}/fields", patch(tickets::update_ticket_field))
        .route(
            "/{id}/comments",
            get(tickets::list_comments).post(tickets::add_comment),
        )
}
