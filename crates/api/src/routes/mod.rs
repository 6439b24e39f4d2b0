pub mod automation;
pub mod health;
pub mod processes;
pub mod recurring;
pub mod tickets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /processes                               list, create
/// /processes/{id}                          get
/// /processes/{id}/stages                   list, create
/// /processes/{id}/tickets                  list
///
/// /tickets                                 create
/// /tickets/{id}                            get
/// /tickets/{id}/move                       move to stage (POST)
/// /tickets/{id}/assign                     assign user (POST)
/// /tickets/{id}/fields                     update one field (PATCH)
/// /tickets/{id}/comments                   list, add
///
/// /recurring/rules                         list, create
/// /recurring/rules/due                     due rules (GET)
/// /recurring/rules/due/execute             run all due rules (POST)
/// /recurring/rules/{id}                    get, update, delete
/// /recurring/rules/{id}/execute            run one rule now (POST)
///
/// /automation/rules                        list, create
/// /automation/rules/{id}                   get, update, delete
/// /automation/rules/{id}/executions        execution history (GET)
/// /automation/rules/{id}/stats             execution stats (GET)
/// /automation/rules/{id}/execute           run against a ticket (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/processes", processes::router())
        .nest("/tickets", tickets::router())
        .nest("/recurring", recurring::router())
        .nest("/automation", automation::router())
}
