//! Repository for the Sakura worker registry.

use sakura_core::sakura::{CreateWorker, Job, Worker, WorkerProgress, MAX_WORKERS_PER_USER};
use sakura_core::types::{new_entity_id, EntityId};

use crate::{SakuraStore, StoreError};

/// Result of an operation that may have taken a job away from a worker.
#[derive(Debug, Clone)]
pub struct WorkerChange {
    pub worker: Worker,
    /// Job that was released back to the queue, if the worker held one.
    pub released_job: Option<Job>,
}

/// Registry operations.
pub struct WorkerRepo;

impl WorkerRepo {
    // ── Registration ─────────────────────────────────────────────────────

    /// Register a new, inactive worker owned by `username`.
    pub async fn register(
        pool: &SakuraStore,
        username: &str,
        input: &CreateWorker,
    ) -> Result<Worker, StoreError> {
        let mut state = pool.state().write().await;

        let owned = state
            .workers
            .values()
            .filter(|w| w.username == username)
            .count();
        if owned >= MAX_WORKERS_PER_USER {
            return Err(StoreError::WorkerLimit {
                username: username.to_string(),
                limit: MAX_WORKERS_PER_USER,
            });
        }

        let worker = Worker {
            id: new_entity_id(),
            username: username.to_string(),
            active: false,
            endpoint: Some(input.endpoint.trim_end_matches('/').to_string()),
            gpu: input.gpu.trim().to_string(),
            description: input.description.clone().unwrap_or_default(),
            progress: None,
        };
        state.workers.insert(worker.id.clone(), worker.clone());
        Ok(worker)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub async fn find_by_id(pool: &SakuraStore, id: &str) -> Option<Worker> {
        pool.state().read().await.workers.get(id).cloned()
    }

    /// All workers in registration order.
    pub async fn list(pool: &SakuraStore) -> Vec<Worker> {
        pool.state().read().await.workers.values().cloned().collect()
    }

    /// Ids of workers that may receive jobs.
    pub async fn list_active_ids(pool: &SakuraStore) -> Vec<EntityId> {
        pool.state()
            .read()
            .await
            .workers
            .values()
            .filter(|w| w.active)
            .map(|w| w.id.clone())
            .collect()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Mark a worker active so the dispatcher may assign to it.
    pub async fn start(pool: &SakuraStore, id: &str) -> Option<Worker> {
        let mut state = pool.state().write().await;
        let worker = state.workers.get_mut(id)?;
        worker.active = true;
        Some(worker.clone())
    }

    /// Mark a worker inactive and release the job it held, if any.
    pub async fn stop(pool: &SakuraStore, id: &str) -> Option<WorkerChange> {
        let mut state = pool.state().write().await;
        let worker = state.workers.get_mut(id)?;
        worker.active = false;
        worker.progress = None;
        let worker = worker.clone();

        let held = state.claimed_by(id).cloned();
        let released_job = held.and_then(|job_id| state.release_job(&job_id));
        Some(WorkerChange {
            worker,
            released_job,
        })
    }

    /// Stop a worker only while it still holds `job_id`.
    ///
    /// Returns `None` if the worker is gone or has moved on, so an operator
    /// stop and restart in the meantime is left alone.
    pub async fn stop_if_holding(
        pool: &SakuraStore,
        id: &str,
        job_id: &str,
    ) -> Option<WorkerChange> {
        let mut state = pool.state().write().await;
        if state.claimed_by(id).map(String::as_str) != Some(job_id) {
            return None;
        }
        let worker = state.workers.get_mut(id)?;
        worker.active = false;
        worker.progress = None;
        let worker = worker.clone();

        let released_job = state.release_job(job_id);
        Some(WorkerChange {
            worker,
            released_job,
        })
    }

    /// Remove a worker and release the job it held, if any.
    pub async fn delete(pool: &SakuraStore, id: &str) -> Option<WorkerChange> {
        let mut state = pool.state().write().await;
        let held = state.claimed_by(id).cloned();
        let released_job = held.and_then(|job_id| state.release_job(&job_id));
        let worker = state.workers.shift_remove(id)?;
        Some(WorkerChange {
            worker,
            released_job,
        })
    }

    // ── Progress ─────────────────────────────────────────────────────────

    /// Record a worker's progress on `job_id`.
    ///
    /// Returns `Ok(None)` if the worker no longer exists or no longer holds
    /// the job, so a report racing a stop or delete is dropped.
    pub async fn report_progress(
        pool: &SakuraStore,
        id: &str,
        job_id: &str,
        total: u32,
        finished: u32,
    ) -> Result<Option<Worker>, StoreError> {
        let progress = WorkerProgress::new(total, finished)
            .map_err(|e| StoreError::InvalidProgress(e.to_string()))?;

        let mut state = pool.state().write().await;
        if state.claimed_by(id).map(String::as_str) != Some(job_id) {
            return Ok(None);
        }
        let Some(worker) = state.workers.get_mut(id) else {
            return Ok(None);
        };
        worker.progress = Some(progress);
        Ok(Some(worker.clone()))
    }
}
