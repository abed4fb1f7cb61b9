//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role is
//! below the minimum requirement. Roles are ordered, so a higher role always
//! passes a lower requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sakura_core::error::CoreError;
use sakura_core::roles::UserRole;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    required: UserRole,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !user.role.at_least(required) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Role {required} or above required"
        ))));
    }
    Ok(user)
}

/// Requires `normal` or above.
///
/// Since banned users never get past [`AuthUser`], this is any signed-in
/// user; it is named so route tables read as intended.
///
/// ```ignore
/// async fn submit(RequireNormal(user): RequireNormal) -> AppResult<String> {
///     Ok(user.username)
/// }
/// ```
pub struct RequireNormal(pub AuthUser);

impl FromRequestParts<AppState> for RequireNormal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Normal)
            .await
            .map(RequireNormal)
    }
}

/// Requires `trusted` or above. Rejects with 403 Forbidden otherwise.
pub struct RequireTrusted(pub AuthUser);

impl FromRequestParts<AppState> for RequireTrusted {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Trusted)
            .await
            .map(RequireTrusted)
    }
}

/// Requires `maintainer` or above. Rejects with 403 Forbidden otherwise.
pub struct RequireMaintainer(pub AuthUser);

impl FromRequestParts<AppState> for RequireMaintainer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Maintainer)
            .await
            .map(RequireMaintainer)
    }
}
