//! Route definitions for the process/stage catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::processes;
use crate::state::AppState;

/// Process routes mounted at `/processes`.
///
/// ```text
/// GET  /               -> list_processes
/// POST /               -> create_process
/// GET  /{id}           -> get_process
/// GET  /{id}/stages    -> list_stages
/// POST /{id}/stages    -> create_stage
/// GET  /{id}/tickets   -> list_tickets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(processes::list_processes).post(processes::create_process),
        )
        .route("/{id}", get(processes::get_process))
        .route(
            "/{id}/stages",
            get(processes::list_stages).post(processes::create_stage),
        )
        .route("/{id}/tickets", get(processes::list_tickets))
}
