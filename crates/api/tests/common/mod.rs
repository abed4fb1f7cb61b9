#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use sakura_api::auth::jwt::{generate_access_token, JwtConfig};
use sakura_api::config::ServerConfig;
use sakura_api::engine::dispatcher::SakuraDispatcher;
use sakura_api::engine::executor::{ExecutionContext, ExecutionError, TaskExecutor};
use sakura_api::router::build_app_router;
use sakura_api::state::AppState;
use sakura_core::roles::UserRole;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        dispatch_interval_secs: 2,
        novel_api_url: None,
        upstream_timeout_secs: 600,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Executor that holds every job until it is cancelled.
pub struct HoldingExecutor;

#[async_trait]
impl TaskExecutor for HoldingExecutor {
    async fn execute(&self, ctx: ExecutionContext) -> Result<(), ExecutionError> {
        ctx.cancel.cancelled().await;
        Err(ExecutionError::Cancelled)
    }
}

/// The router plus the state behind it, so tests can inspect the store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers.
///
/// The dispatcher loop is not spawned, so submitted jobs stay queued unless a
/// test calls `try_dispatch` itself.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let pool = sakura_store::create_pool();
    let dispatcher = SakuraDispatcher::new(
        pool.clone(),
        Arc::new(HoldingExecutor),
        Duration::from_secs(config.dispatch_interval_secs),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher,
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
    }
}

/// Bearer token for `username` with `role`, signed with the test secret.
pub fn token(username: &str, role: UserRole) -> String {
    generate_access_token(username, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, Body::empty()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, Body::empty()).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Body::empty()).await
}

pub async fn post_text(app: Router, uri: &str, token: Option<&str>, body: &str) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        token,
        Some("text/plain"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(token),
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, Body::empty()).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
