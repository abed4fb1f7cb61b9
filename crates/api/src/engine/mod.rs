//! Translation execution engine.
//!
//! Contains the background dispatcher that hands queued jobs to active
//! workers, the executor that runs one job against a worker's Sakura
//! endpoint, the novel source it reads chapters from and writes
//! translations to, and the progress reporter feeding the status view.

pub mod dispatcher;
pub mod executor;
pub mod progress;
pub mod source;
