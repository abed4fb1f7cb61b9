//! HTTP-level integration tests for the `/api/sakura` endpoints.
//!
//! Tests cover job submission and deletion, worker registration and
//! lifecycle, role enforcement, and endpoint redaction in the status view.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, build_test_app, delete_auth, get, get_auth, post_auth,
    post_json_auth, post_text, token, TestApp,
};
use sakura_core::roles::UserRole;
use sakura_store::repositories::{JobRepo, WorkerRepo};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn submit_job(app: &TestApp, token: &str, task: &str) -> String {
    let response = post_text(app.app(), "/api/sakura/job", Some(token), task).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_text(response).await
}

async fn register_worker(app: &TestApp, token: &str) -> String {
    let response = post_json_auth(
        app.app(),
        "/api/sakura/worker",
        token,
        json!({ "gpu": "RTX 4090", "endpoint": "http://10.0.0.5:8080", "description": "home" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_text(response).await
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_is_public_and_starts_empty() {
    let app = build_test_app();
    let response = get(app.app(), "/api/sakura").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["jobs"], json!([]));
    assert_eq!(json["workers"], json!([]));
}

#[tokio::test]
async fn status_rejects_invalid_token() {
    let app = build_test_app();
    let response = get_auth(app.app(), "/api/sakura", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_redacts_endpoints_for_other_users() {
    let app = build_test_app();
    let bob = token("bob", UserRole::Trusted);
    register_worker(&app, &bob).await;

    let anonymous = body_json(get(app.app(), "/api/sakura").await).await;
    assert!(anonymous["workers"][0].get("endpoint").is_none());
    assert_eq!(anonymous["workers"][0]["gpu"], "RTX 4090");

    let other = token("carol", UserRole::Trusted);
    let json = body_json(get_auth(app.app(), "/api/sakura", &other).await).await;
    assert!(json["workers"][0].get("endpoint").is_none());

    let json = body_json(get_auth(app.app(), "/api/sakura", &bob).await).await;
    assert_eq!(json["workers"][0]["endpoint"], "http://10.0.0.5:8080");

    let maintainer = token("mod", UserRole::Maintainer);
    let json = body_json(get_auth(app.app(), "/api/sakura", &maintainer).await).await;
    assert_eq!(json["workers"][0]["endpoint"], "http://10.0.0.5:8080");
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_job_returns_id_and_shows_in_status() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let id = submit_job(&app, &alice, "web/syosetu/n1234?start=5&end=10").await;

    let json = body_json(get(app.app(), "/api/sakura").await).await;
    let job = &json["jobs"][0];
    assert_eq!(job["id"], id.as_str());
    assert_eq!(job["task"], "web/syosetu/n1234?start=5&end=10");
    assert_eq!(job["submitter"], "alice");
    assert!(job["description"].as_str().unwrap().contains("syosetu/n1234"));
    assert!(job["createAt"].is_number());
    assert!(job.get("workerId").is_none());
}

#[tokio::test]
async fn submit_job_normalizes_default_range() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    submit_job(&app, &alice, "wenku/v1/vol2?start=0&end=65535").await;

    let jobs = JobRepo::list(&app.state.pool).await;
    assert_eq!(jobs[0].task, "wenku/v1/vol2");
}

#[tokio::test]
async fn submit_job_requires_auth() {
    let app = build_test_app();
    let response = post_text(app.app(), "/api/sakura/job", None, "web/p/n").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn banned_user_cannot_submit() {
    let app = build_test_app();
    let banned = token("troll", UserRole::Banned);
    let response = post_text(app.app(), "/api/sakura/job", Some(&banned), "web/p/n").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_task_is_rejected() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);

    for task in [
        "",
        "web/p",
        "novel/p/n",
        "web//n",
        "web/p/n?start=x",
        "web/p/n?start=10&end=5",
        "web/p/n?foo=1",
    ] {
        let response = post_text(app.app(), "/api/sakura/job", Some(&alice), task).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "task {task:?}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
    assert!(JobRepo::list(&app.state.pool).await.is_empty());
}

#[tokio::test]
async fn duplicate_task_is_conflict() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    submit_job(&app, &alice, "web/p/n").await;

    let response = post_text(app.app(), "/api/sakura/job", Some(&alice), "web/p/n").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_TASK");
}

#[tokio::test]
async fn delete_job_by_submitter_or_maintainer_only() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let first = submit_job(&app, &alice, "web/p/1").await;
    let second = submit_job(&app, &alice, "web/p/2").await;

    let carol = token("carol", UserRole::Trusted);
    let response = delete_auth(app.app(), &format!("/api/sakura/job/{first}"), &carol).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.app(), &format!("/api/sakura/job/{first}"), &alice).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let maintainer = token("mod", UserRole::Maintainer);
    let response =
        delete_auth(app.app(), &format!("/api/sakura/job/{second}"), &maintainer).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(JobRepo::list(&app.state.pool).await.is_empty());
}

#[tokio::test]
async fn delete_missing_job_is_404() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let response = delete_auth(app.app(), "/api/sakura/job/nope", &alice).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn normal_user_cannot_register_worker() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let response = post_json_auth(
        app.app(),
        "/api/sakura/worker",
        &alice,
        json!({ "gpu": "RTX 3060", "endpoint": "http://h:8080" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_worker_is_rejected() {
    let app = build_test_app();
    let bob = token("bob", UserRole::Trusted);

    for body in [
        json!({ "gpu": "", "endpoint": "http://h:8080" }),
        json!({ "gpu": "RTX", "endpoint": "ftp://h" }),
        json!({ "gpu": "RTX", "endpoint": "http://h", "description": "x".repeat(300) }),
    ] {
        let response = post_json_auth(app.app(), "/api/sakura/worker", &bob, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn worker_lifecycle_by_owner() {
    let app = build_test_app();
    let bob = token("bob", UserRole::Trusted);
    let id = register_worker(&app, &bob).await;

    let worker = WorkerRepo::find_by_id(&app.state.pool, &id).await.unwrap();
    assert_eq!(worker.username, "bob");
    assert!(!worker.active);

    let response = post_auth(app.app(), &format!("/api/sakura/worker/{id}/start"), &bob).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(WorkerRepo::find_by_id(&app.state.pool, &id).await.unwrap().active);

    let response = post_auth(app.app(), &format!("/api/sakura/worker/{id}/stop"), &bob).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!WorkerRepo::find_by_id(&app.state.pool, &id).await.unwrap().active);

    let response = delete_auth(app.app(), &format!("/api/sakura/worker/{id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(WorkerRepo::find_by_id(&app.state.pool, &id).await.is_none());
}

#[tokio::test]
async fn other_users_cannot_control_worker() {
    let app = build_test_app();
    let bob = token("bob", UserRole::Trusted);
    let id = register_worker(&app, &bob).await;
    let carol = token("carol", UserRole::Trusted);

    for path in [
        format!("/api/sakura/worker/{id}/start"),
        format!("/api/sakura/worker/{id}/stop"),
    ] {
        let response = post_auth(app.app(), &path, &carol).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = delete_auth(app.app(), &format!("/api/sakura/worker/{id}"), &carol).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = token("root", UserRole::Admin);
    let response = post_auth(app.app(), &format!("/api/sakura/worker/{id}/start"), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn stop_running_worker_requeues_job() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let bob = token("bob", UserRole::Trusted);
    let job_id = submit_job(&app, &alice, "web/p/n").await;
    let worker_id = register_worker(&app, &bob).await;
    post_auth(app.app(), &format!("/api/sakura/worker/{worker_id}/start"), &bob).await;

    assert_eq!(app.state.dispatcher.try_dispatch().await, 1);
    let job = JobRepo::find_by_id(&app.state.pool, &job_id).await.unwrap();
    assert_eq!(job.worker_id.as_deref(), Some(worker_id.as_str()));

    let response =
        post_auth(app.app(), &format!("/api/sakura/worker/{worker_id}/stop"), &bob).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let job = JobRepo::find_by_id(&app.state.pool, &job_id).await.unwrap();
    assert!(job.worker_id.is_none());

    let status = body_json(get(app.app(), "/api/sakura").await).await;
    assert_eq!(status["workers"][0]["active"], false);
    assert!(status["workers"][0].get("progress").map_or(true, |p| p.is_null()));
}

#[tokio::test]
async fn deleting_running_job_cancels_session() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let bob = token("bob", UserRole::Trusted);
    let job_id = submit_job(&app, &alice, "web/p/n").await;
    let worker_id = register_worker(&app, &bob).await;
    post_auth(app.app(), &format!("/api/sakura/worker/{worker_id}/start"), &bob).await;
    app.state.dispatcher.try_dispatch().await;

    let response = delete_auth(app.app(), &format!("/api/sakura/job/{job_id}"), &alice).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for _ in 0..100 {
        if app.state.dispatcher.session_count().await == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(app.state.dispatcher.session_count().await, 0);
    assert!(WorkerRepo::find_by_id(&app.state.pool, &worker_id)
        .await
        .unwrap()
        .active);
}

// ---------------------------------------------------------------------------
// Incorrect cases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn incorrect_cases_are_recorded_and_listed_for_maintainers() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let response = post_json_auth(
        app.app(),
        "/api/sakura/incorrect-case",
        &alice,
        json!({
            "providerId": "syosetu",
            "novelId": "n1234",
            "chapterId": "7",
            "jp": "彼は笑った。",
            "zh": "她笑了。"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(app.app(), "/api/sakura/incorrect-case", &alice).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let maintainer = token("mod", UserRole::Maintainer);
    let response = get_auth(app.app(), "/api/sakura/incorrect-case?limit=10", &maintainer).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["chapterId"], "7");
    assert_eq!(json[0]["submitter"], "alice");
}

#[tokio::test]
async fn empty_incorrect_case_is_rejected() {
    let app = build_test_app();
    let alice = token("alice", UserRole::Normal);
    let response = post_json_auth(
        app.app(),
        "/api/sakura/incorrect-case",
        &alice,
        json!({ "providerId": "p", "novelId": "n", "chapterId": "c", "jp": " ", "zh": "译" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
