//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SakuraStore` as the first argument.

pub mod incorrect_case_repo;
pub mod job_repo;
pub mod status_repo;
pub mod worker_repo;

pub use incorrect_case_repo::IncorrectCaseRepo;
pub use job_repo::{JobRepo, NewJob};
pub use status_repo::StatusRepo;
pub use worker_repo::WorkerRepo;
