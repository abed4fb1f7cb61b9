//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Accounts live in the main site; this service only verifies the tokens it
//! issues.

pub mod jwt;
