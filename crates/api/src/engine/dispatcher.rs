//! Background job dispatcher.
//!
//! Polls every `poll_interval` (and whenever [`SakuraDispatcher::wake`] is
//! called) and hands the oldest queued job to each active worker that has
//! no running session. Claims go through [`JobRepo::claim_next`], which is
//! atomic, so a job is never held by two workers.
//!
//! Each session runs on its own task with a cancellation token that is a
//! child of the dispatcher's master token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sakura_core::sakura::Job;
use sakura_core::types::EntityId;
use sakura_endpoint::SakuraEndpoint;
use sakura_store::repositories::{JobRepo, WorkerRepo};
use sakura_store::StorePool;
use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use super::executor::{ExecutionContext, ExecutionError, TaskExecutor};
use super::progress::ProgressReporter;

/// Default polling interval for the dispatcher loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default timeout for a single request to a worker's endpoint.
pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(600);

/// Background job dispatcher.
///
/// Created once at startup; the returned `Arc` is shared with handlers so
/// they can wake it and cancel sessions.
pub struct SakuraDispatcher {
    pool: StorePool,
    executor: Arc<dyn TaskExecutor>,
    http: reqwest::Client,
    poll_interval: Duration,
    /// Running sessions indexed by worker id.
    sessions: RwLock<HashMap<EntityId, Session>>,
    next_seq: AtomicU64,
    wake: Notify,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

/// Bookkeeping for one running job.
struct Session {
    /// Distinguishes this session from a later one on the same worker.
    seq: u64,
    job_id: EntityId,
    /// Per-session cancellation token (child of the master token).
    cancel: CancellationToken,
    task_handle: tokio::task::JoinHandle<()>,
}

impl SakuraDispatcher {
    pub fn new(
        pool: StorePool,
        executor: Arc<dyn TaskExecutor>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_ENDPOINT_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_http_client(pool, executor, poll_interval, http)
    }

    /// Like [`new`](Self::new), with the client used for worker endpoints.
    pub fn with_http_client(
        pool: StorePool,
        executor: Arc<dyn TaskExecutor>,
        poll_interval: Duration,
        http: reqwest::Client,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            executor,
            http,
            poll_interval,
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Run the dispatcher loop until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Sakura dispatcher started",
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Sakura dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }
            self.try_dispatch().await;
        }
    }

    /// Ask for a dispatch cycle as soon as possible.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// One dispatch cycle. Returns the number of sessions started.
    pub async fn try_dispatch(self: &Arc<Self>) -> usize {
        if self.cancel.is_cancelled() {
            return 0;
        }

        let mut started = 0;
        for worker_id in WorkerRepo::list_active_ids(&self.pool).await {
            // Held across claim and insert so a concurrent cancel always
            // finds the session it is looking for.
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&worker_id) {
                continue;
            }

            let Some(endpoint) = WorkerRepo::find_by_id(&self.pool, &worker_id)
                .await
                .and_then(|worker| worker.endpoint)
            else {
                continue;
            };

            let Some(job) = JobRepo::claim_next(&self.pool, &worker_id).await else {
                continue;
            };

            tracing::info!(
                job_id = %job.id,
                worker_id = %worker_id,
                task = %job.task,
                "Job claimed by worker",
            );

            let session = self.spawn_session(worker_id.clone(), &endpoint, job);
            sessions.insert(worker_id, session);
            started += 1;
        }
        started
    }

    /// Cancel the session running on `worker_id`, if any.
    ///
    /// Callers update the store first (stop or delete the worker); the
    /// session then ends without touching the job.
    pub async fn cancel_worker(&self, worker_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(worker_id) {
            Some(session) => {
                tracing::info!(worker_id, job_id = %session.job_id, "Cancelling session");
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel whichever session is running `job_id`, if any.
    pub async fn cancel_job(&self, job_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions
            .iter()
            .find(|(_, session)| session.job_id == job_id)
        {
            Some((worker_id, session)) => {
                tracing::info!(worker_id = %worker_id, job_id, "Cancelling session");
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of sessions currently running.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Stop dispatching and wait up to `timeout` for running sessions.
    pub async fn shutdown(&self, timeout: Duration) {
        tracing::info!("Shutting down Sakura dispatcher");
        self.cancel.cancel();

        // Sessions remove themselves on exit, so the lock must not be held
        // while waiting for them.
        let drained: Vec<(EntityId, Session)> = self.sessions.write().await.drain().collect();
        for (worker_id, session) in drained {
            tracing::info!(worker_id = %worker_id, "Stopping session");
            session.cancel.cancel();
            let _ = tokio::time::timeout(timeout, session.task_handle).await;
        }

        tracing::info!("Sakura dispatcher shut down complete");
    }

    // ---- private helpers ----

    fn spawn_session(self: &Arc<Self>, worker_id: EntityId, endpoint: &str, job: Job) -> Session {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let cancel = self.cancel.child_token();
        let job_id = job.id.clone();

        let ctx = ExecutionContext {
            progress: ProgressReporter::new(self.pool.clone(), worker_id.clone(), job.id.clone()),
            endpoint: SakuraEndpoint::with_client(self.http.clone(), endpoint),
            worker_id: worker_id.clone(),
            cancel: cancel.clone(),
            job,
        };

        let dispatcher = Arc::clone(self);
        let session_cancel = cancel.clone();
        let session_job_id = job_id.clone();
        let task_handle = tokio::spawn(async move {
            // Run on a separate task so a panic surfaces as a JoinError and
            // the session is still finished.
            let executor = Arc::clone(&dispatcher.executor);
            let result = match tokio::spawn(async move { executor.execute(ctx).await }).await {
                Ok(result) => result,
                Err(e) => Err(ExecutionError::Panicked(e.to_string())),
            };
            let result = if session_cancel.is_cancelled() {
                Err(ExecutionError::Cancelled)
            } else {
                result
            };
            dispatcher
                .finish_session(&worker_id, &session_job_id, seq, result)
                .await;
        });

        Session {
            seq,
            job_id,
            cancel,
            task_handle,
        }
    }

    /// Apply a session's outcome to the store and free the worker.
    async fn finish_session(
        &self,
        worker_id: &str,
        job_id: &str,
        seq: u64,
        result: Result<(), ExecutionError>,
    ) {
        match result {
            Ok(()) => match JobRepo::complete(&self.pool, job_id, worker_id).await {
                Some(_) => tracing::info!(job_id, worker_id, "Job completed"),
                None => tracing::debug!(job_id, worker_id, "Job was removed while running"),
            },
            Err(ExecutionError::Cancelled) => {
                tracing::info!(job_id, worker_id, "Session cancelled");
            }
            Err(ExecutionError::Endpoint(e)) => {
                tracing::warn!(
                    job_id,
                    worker_id,
                    error = %e,
                    "Endpoint failed, stopping worker",
                );
                WorkerRepo::stop_if_holding(&self.pool, worker_id, job_id).await;
            }
            Err(
                e @ (ExecutionError::Reply(_)
                | ExecutionError::Source(_)
                | ExecutionError::Task(_)
                | ExecutionError::Panicked(_)),
            ) => {
                tracing::warn!(
                    job_id,
                    worker_id,
                    error = %e,
                    "Job cannot be processed, dropping it",
                );
                // Removal only succeeds while this worker still holds the job.
                JobRepo::complete(&self.pool, job_id, worker_id).await;
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(worker_id).is_some_and(|s| s.seq == seq) {
            sessions.remove(worker_id);
        }
        drop(sessions);
        self.wake();
    }
}
