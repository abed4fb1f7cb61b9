//! Domain types and pure rules for the Sakura translation dispatch service.
//!
//! Nothing in this crate performs I/O; the store, endpoint client, API and
//! client crates all build on these types.

pub mod error;
pub mod incorrect_case;
pub mod roles;
pub mod sakura;
pub mod session;
pub mod task;
pub mod types;
