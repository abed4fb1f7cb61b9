//! Point-in-time status snapshot.

use sakura_core::sakura::SakuraStatus;

use crate::SakuraStore;

pub struct StatusRepo;

impl StatusRepo {
    /// Copy every job and worker under a single read lock, so no half-applied
    /// mutation is ever visible.
    pub async fn snapshot(pool: &SakuraStore) -> SakuraStatus {
        let state = pool.state().read().await;
        SakuraStatus {
            jobs: state.jobs.values().cloned().collect(),
            workers: state.workers.values().cloned().collect(),
        }
    }
}
