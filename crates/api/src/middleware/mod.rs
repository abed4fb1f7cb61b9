//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous requests pass through.
//! - [`rbac::RequireNormal`] -- Requires `normal` or above.
//! - [`rbac::RequireTrusted`] -- Requires `trusted` or above.
//! - [`rbac::RequireMaintainer`] -- Requires `maintainer` or above.

pub mod auth;
pub mod rbac;
