//! Typed REST client for the Sakura dispatch API.
//!
//! Wraps every `/api/sakura` operation; see [`SakuraClient`].

pub mod api;

pub use api::{ClientError, SakuraClient};
