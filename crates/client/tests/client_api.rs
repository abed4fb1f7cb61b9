//! `SakuraClient` against a real API server on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use sakura_api::auth::jwt::{generate_access_token, JwtConfig};
use sakura_api::config::ServerConfig;
use sakura_api::engine::dispatcher::SakuraDispatcher;
use sakura_api::engine::executor::SakuraExecutor;
use sakura_api::engine::source::MemoryNovelSource;
use sakura_api::router::build_app_router;
use sakura_api::state::AppState;
use sakura_client::{ClientError, SakuraClient};
use sakura_core::incorrect_case::CreateIncorrectCase;
use sakura_core::roles::UserRole;
use sakura_core::sakura::CreateWorker;
use sakura_core::task::TranslateRange;

fn config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        dispatch_interval_secs: 60,
        novel_api_url: None,
        upstream_timeout_secs: 600,
        jwt: JwtConfig {
            secret: "client-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Start the API (without the dispatch loop) and return its base URL.
async fn spawn_server() -> String {
    let config = config();
    let pool = sakura_store::create_pool();
    let executor = SakuraExecutor::new(Arc::new(MemoryNovelSource::new()));
    let dispatcher = SakuraDispatcher::new(pool.clone(), Arc::new(executor), Duration::from_secs(60));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher,
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(url: &str, username: &str, role: UserRole) -> SakuraClient {
    let token = generate_access_token(username, role, &config().jwt).unwrap();
    SakuraClient::new(url).with_token(token)
}

#[tokio::test]
async fn default_range_is_omitted_from_task() {
    let url = spawn_server().await;
    let alice = client(&url, "alice", UserRole::Normal);

    let id = alice
        .create_job_web_translate("p", "n", TranslateRange::new(0, 65535))
        .await
        .unwrap();

    let status = alice.get_status().await.unwrap();
    assert_eq!(status.jobs.len(), 1);
    assert_eq!(status.jobs[0].id, id);
    assert_eq!(status.jobs[0].task, "web/p/n");
}

#[tokio::test]
async fn explicit_range_is_encoded() {
    let url = spawn_server().await;
    let alice = client(&url, "alice", UserRole::Normal);

    alice
        .create_job_web_translate("p", "n", TranslateRange::new(5, 10))
        .await
        .unwrap();
    alice
        .create_job_wenku_translate("w", "v", TranslateRange::new(3, 65535))
        .await
        .unwrap();
    alice
        .create_job_wenku_translate("w", "v2", TranslateRange::new(0, 7))
        .await
        .unwrap();

    let tasks: Vec<String> = alice
        .get_status()
        .await
        .unwrap()
        .jobs
        .into_iter()
        .map(|job| job.task)
        .collect();
    assert_eq!(
        tasks,
        vec!["web/p/n?start=5&end=10", "wenku/w/v?start=3", "wenku/w/v2?end=7"]
    );
}

#[tokio::test]
async fn invalid_task_is_rejected_before_sending() {
    let url = spawn_server().await;
    let alice = client(&url, "alice", UserRole::Normal);

    let err = alice
        .create_job_web_translate("p", "n", TranslateRange::new(10, 5))
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::InvalidTask(_));
    assert!(alice.get_status().await.unwrap().jobs.is_empty());
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let url = spawn_server().await;

    let anonymous = SakuraClient::new(&url);
    let err = anonymous.create_job("web/p/n").await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 401, .. });

    let alice = client(&url, "alice", UserRole::Normal);
    let err = alice.delete_job("missing").await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 404, ref body } if body.contains("NOT_FOUND"));
}

#[tokio::test]
async fn worker_lifecycle_round_trip() {
    let url = spawn_server().await;
    let bob = client(&url, "bob", UserRole::Trusted);

    let id = bob
        .create_worker(&CreateWorker {
            gpu: "RTX 4090".to_string(),
            endpoint: "http://10.0.0.2:8080".to_string(),
            description: None,
        })
        .await
        .unwrap();

    bob.start_worker(&id).await.unwrap();
    let status = bob.get_status().await.unwrap();
    assert!(status.workers[0].active);
    assert_eq!(status.workers[0].endpoint.as_deref(), Some("http://10.0.0.2:8080"));

    // Anonymous viewers do not see endpoints.
    let status = SakuraClient::new(&url).get_status().await.unwrap();
    assert!(status.workers[0].endpoint.is_none());

    bob.stop_worker(&id).await.unwrap();
    bob.delete_worker(&id).await.unwrap();
    assert!(bob.get_status().await.unwrap().workers.is_empty());
}

#[tokio::test]
async fn incorrect_cases_round_trip() {
    let url = spawn_server().await;
    let alice = client(&url, "alice", UserRole::Normal);
    alice
        .create_incorrect_case(&CreateIncorrectCase {
            provider_id: "syosetu".to_string(),
            novel_id: "n1".to_string(),
            chapter_id: "3".to_string(),
            jp: "原文".to_string(),
            zh: "译文".to_string(),
        })
        .await
        .unwrap();

    let maintainer = client(&url, "mod", UserRole::Maintainer);
    let cases = maintainer.list_incorrect_cases(Some(5)).await.unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].submitter, "alice");
}
