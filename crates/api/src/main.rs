use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sakura_api::config::ServerConfig;
use sakura_api::engine::dispatcher::SakuraDispatcher;
use sakura_api::engine::executor::SakuraExecutor;
use sakura_api::engine::source::{HttpNovelSource, MemoryNovelSource, NovelSource};
use sakura_api::router::build_app_router;
use sakura_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sakura_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let pool = sakura_store::create_pool();
    tracing::info!("In-memory store created");

    // --- Upstream HTTP client ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .build()
        .expect("Failed to build reqwest HTTP client");

    // --- Novel source ---
    let source: Arc<dyn NovelSource> = match config.novel_api_url {
        Some(ref url) => {
            tracing::info!(url = %url, "Using upstream novel API");
            Arc::new(HttpNovelSource::new(http.clone(), url))
        }
        None => {
            tracing::warn!("NOVEL_API_URL not set, using in-memory novel source");
            Arc::new(MemoryNovelSource::new())
        }
    };

    // --- Dispatcher ---
    let dispatcher = SakuraDispatcher::with_http_client(
        pool.clone(),
        Arc::new(SakuraExecutor::new(source)),
        Duration::from_secs(config.dispatch_interval_secs),
        http,
    );
    let dispatcher_handle = tokio::spawn(Arc::clone(&dispatcher).run());
    tracing::info!("Sakura dispatcher started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher: Arc::clone(&dispatcher),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    dispatcher
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
