pub mod health;
pub mod sakura;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sakura                                          status, jobs, workers (see routes::sakura)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sakura", sakura::router())
}
