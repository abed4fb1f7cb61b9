//! In-memory store for the Sakura job queue, worker registry and
//! mistranslation samples.
//!
//! All records live behind a single [`tokio::sync::RwLock`]: every mutation
//! takes the write lock exactly once, so a claim is atomic and a read sees a
//! point-in-time view of both jobs and workers.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::RwLock;

use sakura_core::incorrect_case::IncorrectCase;
use sakura_core::sakura::{Job, Worker};
use sakura_core::types::EntityId;

pub mod error;
pub mod repositories;

pub use error::StoreError;

/// Shared handle to the store, cloned into every repository call site.
pub type StorePool = Arc<SakuraStore>;

/// Maximum number of incorrect-case samples kept; oldest are dropped first.
pub const MAX_INCORRECT_CASES: usize = 10_000;

#[derive(Debug, Default)]
pub struct SakuraStore {
    state: RwLock<StoreState>,
}

/// Everything guarded by the store lock.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Insertion order is dispatch order.
    pub(crate) jobs: IndexMap<EntityId, Job>,
    pub(crate) workers: IndexMap<EntityId, Worker>,
    pub(crate) incorrect_cases: VecDeque<IncorrectCase>,
}

impl StoreState {
    /// Job currently claimed by `worker_id`, if any.
    pub(crate) fn claimed_by(&self, worker_id: &str) -> Option<&EntityId> {
        self.jobs
            .values()
            .find(|job| job.worker_id.as_deref() == Some(worker_id))
            .map(|job| &job.id)
    }

    /// Unassign a job and clear the progress of the worker that held it.
    pub(crate) fn release_job(&mut self, job_id: &str) -> Option<Job> {
        let job = self.jobs.get_mut(job_id)?;
        let worker_id = job.worker_id.take()?;
        let released = job.clone();
        if let Some(worker) = self.workers.get_mut(&worker_id) {
            worker.progress = None;
        }
        Some(released)
    }

    /// Clear the progress of whichever worker holds `job`.
    pub(crate) fn clear_progress_of(&mut self, job: &Job) {
        if let Some(worker) = job
            .worker_id
            .as_ref()
            .and_then(|id| self.workers.get_mut(id))
        {
            worker.progress = None;
        }
    }
}

impl SakuraStore {
    pub(crate) fn state(&self) -> &RwLock<StoreState> {
        &self.state
    }
}

/// Create an empty store.
pub fn create_pool() -> StorePool {
    Arc::new(SakuraStore::default())
}

/// Record counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub jobs: usize,
    pub claimed_jobs: usize,
    pub workers: usize,
    pub active_workers: usize,
}

/// Read record counts. Also proves the lock is not poisoned by a stuck writer.
pub async fn health_check(pool: &SakuraStore) -> StoreStats {
    let state = pool.state().read().await;
    StoreStats {
        jobs: state.jobs.len(),
        claimed_jobs: state.jobs.values().filter(|j| j.is_claimed()).count(),
        workers: state.workers.len(),
        active_workers: state.workers.values().filter(|w| w.active).count(),
    }
}
