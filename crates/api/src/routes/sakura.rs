//! Route definitions for the `/sakura` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sakura;
use crate::state::AppState;

/// Routes mounted at `/sakura`.
///
/// ```text
/// GET    /                      -> get_status            (optional auth)
/// POST   /job                   -> create_job            (normal+)
/// DELETE /job/{id}              -> delete_job            (submitter or maintainer+)
/// POST   /worker                -> create_worker         (trusted+)
/// DELETE /worker/{id}           -> delete_worker         (owner or maintainer+)
/// POST   /worker/{id}/start     -> start_worker          (owner or maintainer+)
/// POST   /worker/{id}/stop      -> stop_worker           (owner or maintainer+)
/// GET    /incorrect-case        -> list_incorrect_cases  (maintainer+)
/// POST   /incorrect-case        -> create_incorrect_case (normal+)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sakura::get_status))
        .route("/job", post(sakura::create_job))
        .route("/job/{id}", delete(sakura::delete_job))
        .route("/worker", post(sakura::create_worker))
        .route("/worker/{id}", delete(sakura::delete_worker))
        .route("/worker/{id}/start", post(sakura::start_worker))
        .route("/worker/{id}/stop", post(sakura::stop_worker))
        .route(
            "/incorrect-case",
            get(sakura::list_incorrect_cases).post(sakura::create_incorrect_case),
        )
}
