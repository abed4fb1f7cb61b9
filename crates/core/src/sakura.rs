//! Sakura job and worker models, limits, and input validation.
//!
//! These are the wire types of the `/sakura` API as well as the records
//! held by the store. Field names serialize in camelCase.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::UserRole;
use crate::types::{EntityId, UnixSeconds};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of jobs held in the queue (claimed or not).
pub const MAX_JOBS: usize = 1000;

/// Maximum number of workers a single user may register.
pub const MAX_WORKERS_PER_USER: usize = 8;

const MAX_GPU_LEN: usize = 64;
const MAX_ENDPOINT_LEN: usize = 256;
const MAX_DESCRIPTION_LEN: usize = 256;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: EntityId,
    pub task: String,
    pub description: String,
    /// Set while a worker has claimed the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<EntityId>,
    pub submitter: String,
    pub create_at: UnixSeconds,
}

impl Job {
    pub fn is_claimed(&self) -> bool {
        self.worker_id.is_some()
    }
}

/// Units of a running job a worker has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerProgress {
    pub total: u32,
    pub finished: u32,
}

impl WorkerProgress {
    /// Build a progress value, rejecting `finished > total`.
    pub fn new(total: u32, finished: u32) -> Result<Self, CoreError> {
        if finished > total {
            return Err(CoreError::Validation(format!(
                "Finished units ({finished}) exceed total ({total})"
            )));
        }
        Ok(Self { total, finished })
    }

    pub fn is_complete(&self) -> bool {
        self.finished == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: EntityId,
    /// Owning user.
    pub username: String,
    pub active: bool,
    /// Omitted in views where the caller may not see it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub gpu: String,
    pub description: String,
    pub progress: Option<WorkerProgress>,
}

/// Combined view of the queue and the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SakuraStatus {
    pub jobs: Vec<Job>,
    pub workers: Vec<Worker>,
}

impl SakuraStatus {
    /// Hide endpoints of workers the viewer neither owns nor moderates.
    ///
    /// Anonymous viewers (`None`) see no endpoints at all.
    pub fn redact_endpoints(&mut self, viewer: Option<(&str, UserRole)>) {
        for worker in &mut self.workers {
            let visible = match viewer {
                Some((username, role)) => {
                    role.at_least(UserRole::Maintainer) || worker.username == username
                }
                None => false,
            };
            if !visible {
                worker.endpoint = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /sakura/worker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorker {
    pub gpu: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a worker registration.
///
/// Rules:
/// - `gpu` is 1..=64 characters.
/// - `endpoint` is an `http://` or `https://` URL with a host, without
///   whitespace, at most 256 characters.
/// - `description`, when present, is at most 256 characters.
pub fn validate_create_worker(input: &CreateWorker) -> Result<(), CoreError> {
    let gpu = input.gpu.trim();
    if gpu.is_empty() {
        return Err(CoreError::Validation("GPU must not be empty".to_string()));
    }
    if gpu.chars().count() > MAX_GPU_LEN {
        return Err(CoreError::Validation(format!(
            "GPU must not exceed {MAX_GPU_LEN} characters"
        )));
    }
    validate_endpoint(&input.endpoint)?;
    if let Some(ref description) = input.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(CoreError::Validation(format!(
                "Description must not exceed {MAX_DESCRIPTION_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Validate a worker endpoint URL.
pub fn validate_endpoint(endpoint: &str) -> Result<(), CoreError> {
    if endpoint.len() > MAX_ENDPOINT_LEN {
        return Err(CoreError::Validation(format!(
            "Endpoint must not exceed {MAX_ENDPOINT_LEN} characters"
        )));
    }
    let rest = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .ok_or_else(|| {
            CoreError::Validation("Endpoint must start with http:// or https://".to_string())
        })?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(CoreError::Validation(
            "Endpoint must include a host".to_string(),
        ));
    }
    if endpoint.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(
            "Endpoint must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}
