use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::dispatcher::SakuraDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Job queue, worker registry and incorrect-case samples.
    pub pool: sakura_store::StorePool,
    /// Server configuration (JWT settings are read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// Assigns queued jobs to active workers and runs them.
    pub dispatcher: Arc<SakuraDispatcher>,
}
