//! Handlers for the `/sakura` resource.
//!
//! The status view is public; every mutation requires authentication.
//! Jobs and workers can be removed or toggled by their owner or by a
//! maintainer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use sakura_core::error::CoreError;
use sakura_core::incorrect_case::{validate_incorrect_case, CreateIncorrectCase};
use sakura_core::sakura::{validate_create_worker, CreateWorker, Job, Worker};
use sakura_core::task::SakuraTask;
use sakura_store::repositories::{IncorrectCaseRepo, JobRepo, NewJob, StatusRepo, WorkerRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::{RequireMaintainer, RequireNormal, RequireTrusted};
use crate::state::AppState;

/// Default and maximum page size for incorrect-case listings.
const DEFAULT_CASE_LIMIT: usize = 100;
const MAX_CASE_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a job and verify the caller submitted it (or is a maintainer).
async fn find_job_and_authorize(
    state: &AppState,
    job_id: &str,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Job> {
    let job = JobRepo::find_by_id(&state.pool, job_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Job", job_id)))?;

    if !auth.owns_or_moderates(&job.submitter) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's job"
        ))));
    }
    Ok(job)
}

/// Fetch a worker and verify the caller owns it (or is a maintainer).
async fn find_worker_and_authorize(
    state: &AppState,
    worker_id: &str,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Worker> {
    let worker = WorkerRepo::find_by_id(&state.pool, worker_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Worker", worker_id)))?;

    if !auth.owns_or_moderates(&worker.username) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's worker"
        ))));
    }
    Ok(worker)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/sakura
///
/// Current jobs and workers. Endpoints are only shown to their owner and
/// to maintainers.
pub async fn get_status(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut status = StatusRepo::snapshot(&state.pool).await;
    status.redact_endpoints(viewer.as_ref().map(|u| (u.username.as_str(), u.role)));
    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// POST /api/sakura/job
///
/// Body is the task string as plain text. Returns 201 with the new job id.
pub async fn create_job(
    RequireNormal(auth): RequireNormal,
    State(state): State<AppState>,
    body: String,
) -> AppResult<impl IntoResponse> {
    let task: SakuraTask = body.trim().parse()?;

    let job = JobRepo::submit(
        &state.pool,
        NewJob {
            task: task.to_string(),
            description: task.description(),
            submitter: auth.username.clone(),
        },
    )
    .await?;

    tracing::info!(
        job_id = %job.id,
        task = %job.task,
        username = %auth.username,
        "Job submitted",
    );
    state.dispatcher.wake();

    Ok((StatusCode::CREATED, job.id))
}

/// DELETE /api/sakura/job/{id}
///
/// Remove a job, cancelling it if a worker is running it.
pub async fn delete_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    find_job_and_authorize(&state, &job_id, &auth, "delete").await?;

    let job = JobRepo::delete(&state.pool, &job_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Job", &job_id)))?;
    if job.is_claimed() {
        state.dispatcher.cancel_job(&job.id).await;
    }

    tracing::info!(job_id = %job.id, username = %auth.username, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// POST /api/sakura/worker
///
/// Register a worker for the caller. It starts inactive. Returns 201 with
/// the new worker id.
pub async fn create_worker(
    RequireTrusted(auth): RequireTrusted,
    State(state): State<AppState>,
    Json(input): Json<CreateWorker>,
) -> AppResult<impl IntoResponse> {
    validate_create_worker(&input)?;

    let worker = WorkerRepo::register(&state.pool, &auth.username, &input).await?;

    tracing::info!(
        worker_id = %worker.id,
        gpu = %worker.gpu,
        username = %auth.username,
        "Worker registered",
    );
    Ok((StatusCode::CREATED, worker.id))
}

/// DELETE /api/sakura/worker/{id}
///
/// Remove a worker. A job it was running goes back to the queue.
pub async fn delete_worker(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    find_worker_and_authorize(&state, &worker_id, &auth, "delete").await?;

    let change = WorkerRepo::delete(&state.pool, &worker_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Worker", &worker_id)))?;
    state.dispatcher.cancel_worker(&worker_id).await;
    if change.released_job.is_some() {
        state.dispatcher.wake();
    }

    tracing::info!(worker_id = %worker_id, username = %auth.username, "Worker deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sakura/worker/{id}/start
pub async fn start_worker(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    find_worker_and_authorize(&state, &worker_id, &auth, "start").await?;

    WorkerRepo::start(&state.pool, &worker_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Worker", &worker_id)))?;
    state.dispatcher.wake();

    tracing::info!(worker_id = %worker_id, username = %auth.username, "Worker started");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sakura/worker/{id}/stop
///
/// Deactivate a worker. A job it was running goes back to the queue.
pub async fn stop_worker(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    find_worker_and_authorize(&state, &worker_id, &auth, "stop").await?;

    let change = WorkerRepo::stop(&state.pool, &worker_id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Worker", &worker_id)))?;
    state.dispatcher.cancel_worker(&worker_id).await;
    if change.released_job.is_some() {
        state.dispatcher.wake();
    }

    tracing::info!(worker_id = %worker_id, username = %auth.username, "Worker stopped");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Incorrect cases
// ---------------------------------------------------------------------------

/// POST /api/sakura/incorrect-case
///
/// Report a mistranslated excerpt. Returns 201 with the sample id.
pub async fn create_incorrect_case(
    RequireNormal(auth): RequireNormal,
    State(state): State<AppState>,
    Json(input): Json<CreateIncorrectCase>,
) -> AppResult<impl IntoResponse> {
    validate_incorrect_case(&input)?;

    let case = IncorrectCaseRepo::create(&state.pool, &auth.username, input).await;

    tracing::info!(
        case_id = %case.id,
        novel_id = %case.novel_id,
        chapter_id = %case.chapter_id,
        username = %auth.username,
        "Incorrect case reported",
    );
    Ok((StatusCode::CREATED, case.id))
}

#[derive(Debug, Deserialize)]
pub struct IncorrectCaseQuery {
    pub limit: Option<usize>,
}

/// GET /api/sakura/incorrect-case
///
/// Reported samples, newest first. Maintainers only.
pub async fn list_incorrect_cases(
    RequireMaintainer(_auth): RequireMaintainer,
    State(state): State<AppState>,
    Query(params): Query<IncorrectCaseQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_CASE_LIMIT)
        .clamp(1, MAX_CASE_LIMIT);
    let cases = IncorrectCaseRepo::list(&state.pool, limit).await;
    Ok(Json(cases))
}
