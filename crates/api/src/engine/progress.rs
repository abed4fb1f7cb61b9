//! Worker progress reporting for a running job.
//!
//! Progress lives on the worker record so it shows up in the status view.
//! Reports from a session that no longer holds its job are dropped by the
//! store.

use sakura_core::types::EntityId;
use sakura_store::repositories::WorkerRepo;
use sakura_store::StorePool;

/// Writes `(total, finished)` for one worker/job pair.
#[derive(Clone)]
pub struct ProgressReporter {
    pool: StorePool,
    worker_id: EntityId,
    job_id: EntityId,
}

impl ProgressReporter {
    pub fn new(pool: StorePool, worker_id: EntityId, job_id: EntityId) -> Self {
        Self {
            pool,
            worker_id,
            job_id,
        }
    }

    /// Record that `finished` of `total` chapters are done.
    ///
    /// Failures are logged, never propagated: progress is informational.
    pub async fn report(&self, total: u32, finished: u32) {
        match WorkerRepo::report_progress(&self.pool, &self.worker_id, &self.job_id, total, finished)
            .await
        {
            Ok(Some(_)) => {
                tracing::debug!(
                    worker_id = %self.worker_id,
                    job_id = %self.job_id,
                    total,
                    finished,
                    "Progress updated",
                );
            }
            Ok(None) => {
                tracing::debug!(
                    worker_id = %self.worker_id,
                    job_id = %self.job_id,
                    "Progress dropped, job no longer held",
                );
            }
            Err(e) => {
                tracing::error!(
                    worker_id = %self.worker_id,
                    job_id = %self.job_id,
                    error = %e,
                    "Failed to update progress",
                );
            }
        }
    }
}
