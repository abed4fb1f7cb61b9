//! Repository for the Sakura job queue.

use sakura_core::sakura::{Job, MAX_JOBS};
use sakura_core::types::{new_entity_id, now_unix};

use crate::{SakuraStore, StoreError};

/// Input for [`JobRepo::submit`].
#[derive(Debug, Clone)]
pub struct NewJob {
    pub task: String,
    pub description: String,
    pub submitter: String,
}

/// Queue operations. Jobs are kept in submission order, which is also the
/// order in which [`JobRepo::claim_next`] hands them out.
pub struct JobRepo;

impl JobRepo {
    // ── Submission ───────────────────────────────────────────────────────

    /// Append a job to the queue.
    ///
    /// The task string is stored as given. Fails when the queue is full or
    /// an identical task is already queued.
    pub async fn submit(pool: &SakuraStore, input: NewJob) -> Result<Job, StoreError> {
        let mut state = pool.state().write().await;

        if state.jobs.len() >= MAX_JOBS {
            return Err(StoreError::QueueFull {
                capacity: MAX_JOBS,
            });
        }
        if let Some(existing) = state.jobs.values().find(|j| j.task == input.task) {
            return Err(StoreError::DuplicateTask {
                existing: existing.id.clone(),
            });
        }

        let job = Job {
            id: new_entity_id(),
            task: input.task,
            description: input.description,
            worker_id: None,
            submitter: input.submitter,
            create_at: now_unix(),
        };
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub async fn find_by_id(pool: &SakuraStore, id: &str) -> Option<Job> {
        pool.state().read().await.jobs.get(id).cloned()
    }

    /// All jobs in queue order.
    pub async fn list(pool: &SakuraStore) -> Vec<Job> {
        pool.state().read().await.jobs.values().cloned().collect()
    }

    /// The job a worker currently holds.
    pub async fn find_claimed_by(pool: &SakuraStore, worker_id: &str) -> Option<Job> {
        let state = pool.state().read().await;
        let job_id = state.claimed_by(worker_id)?;
        state.jobs.get(job_id).cloned()
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    /// Assign the oldest unclaimed job to `worker_id`.
    ///
    /// Returns `None` when the worker is unknown, inactive, already holds a
    /// job, or the queue has nothing unclaimed.
    pub async fn claim_next(pool: &SakuraStore, worker_id: &str) -> Option<Job> {
        let mut guard = pool.state().write().await;
        let state = &mut *guard;

        let worker = state.workers.get_mut(worker_id).filter(|w| w.active)?;
        if state
            .jobs
            .values()
            .any(|j| j.worker_id.as_deref() == Some(worker_id))
        {
            return None;
        }

        let job = state.jobs.values_mut().find(|j| j.worker_id.is_none())?;
        job.worker_id = Some(worker_id.to_string());
        worker.progress = None;
        Some(job.clone())
    }

    /// Put a claimed job back in the queue at its original position.
    ///
    /// Returns the released job, or `None` if it was not claimed.
    pub async fn release(pool: &SakuraStore, id: &str) -> Option<Job> {
        pool.state().write().await.release_job(id)
    }

    /// Remove a finished job, provided `worker_id` still holds it.
    pub async fn complete(pool: &SakuraStore, id: &str, worker_id: &str) -> Option<Job> {
        let mut state = pool.state().write().await;
        let held = state
            .jobs
            .get(id)
            .is_some_and(|j| j.worker_id.as_deref() == Some(worker_id));
        if !held {
            return None;
        }
        let job = state.jobs.shift_remove(id)?;
        state.clear_progress_of(&job);
        Some(job)
    }

    // ── Deletion ─────────────────────────────────────────────────────────

    /// Delete a job. If it was claimed, the holder's progress is cleared.
    pub async fn delete(pool: &SakuraStore, id: &str) -> Option<Job> {
        let mut state = pool.state().write().await;
        let job = state.jobs.shift_remove(id)?;
        state.clear_progress_of(&job);
        Some(job)
    }
}
