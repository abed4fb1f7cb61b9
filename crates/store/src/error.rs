use sakura_core::types::EntityId;

/// Errors raised by store mutations that violate a queue or registry rule.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The queue already holds the maximum number of jobs.
    #[error("Job queue is full ({capacity} jobs)")]
    QueueFull { capacity: usize },

    /// An identical task is already queued.
    #[error("Task is already queued as job {existing}")]
    DuplicateTask { existing: EntityId },

    /// The user already owns the maximum number of workers.
    #[error("User {username} already has {limit} workers")]
    WorkerLimit { username: String, limit: usize },

    /// A progress report broke `finished <= total`.
    #[error("Invalid progress: {0}")]
    InvalidProgress(String),
}
