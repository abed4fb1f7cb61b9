//! Client-side sign-in session.
//!
//! A [`UserSession`] holds the profile returned by sign-in. Every accessor
//! treats an expired profile exactly like a missing one, so callers never
//! see a username, token or role from a session that has lapsed.
//!
//! All accessors take `now` explicitly (Unix seconds) so expiry is testable.

use serde::{Deserialize, Serialize};

use crate::roles::UserRole;
use crate::types::UnixSeconds;

const WEEK_SECS: i64 = 7 * 24 * 3600;
const MONTH_SECS: i64 = 30 * 24 * 3600;

/// Profile issued on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInProfile {
    pub username: String,
    pub role: UserRole,
    pub token: String,
    /// Account creation time.
    pub create_at: UnixSeconds,
    /// Session expiry.
    pub expires_at: UnixSeconds,
}

/// Persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub info: Option<SignInProfile>,
    pub renewed_at: Option<UnixSeconds>,
    pub admin_mode: bool,
}

impl UserSession {
    /// The profile, if present and not yet expired at `now`.
    pub fn valid_profile(&self, now: UnixSeconds) -> Option<&SignInProfile> {
        self.info.as_ref().filter(|info| now <= info.expires_at)
    }

    pub fn is_logged_in(&self, now: UnixSeconds) -> bool {
        self.valid_profile(now).is_some()
    }

    pub fn username(&self, now: UnixSeconds) -> Option<&str> {
        self.valid_profile(now).map(|p| p.username.as_str())
    }

    pub fn token(&self, now: UnixSeconds) -> Option<&str> {
        self.valid_profile(now).map(|p| p.token.as_str())
    }

    pub fn role(&self, now: UnixSeconds) -> Option<UserRole> {
        self.valid_profile(now).map(|p| p.role)
    }

    /// Account is older than a week.
    pub fn passed_week(&self, now: UnixSeconds) -> bool {
        self.account_age(now).is_some_and(|age| age > WEEK_SECS)
    }

    /// Account is older than thirty days.
    pub fn passed_month(&self, now: UnixSeconds) -> bool {
        self.account_age(now).is_some_and(|age| age > MONTH_SECS)
    }

    pub fn role_at_least(&self, now: UnixSeconds, required: UserRole) -> bool {
        self.role(now).is_some_and(|role| role.at_least(required))
    }

    pub fn is_admin(&self, now: UnixSeconds) -> bool {
        self.role_at_least(now, UserRole::Admin)
    }

    pub fn is_maintainer(&self, now: UnixSeconds) -> bool {
        self.role_at_least(now, UserRole::Maintainer)
    }

    /// Admin privileges are only exercised while admin mode is toggled on.
    pub fn as_admin(&self, now: UnixSeconds) -> bool {
        self.admin_mode && self.is_admin(now)
    }

    pub fn set_profile(&mut self, profile: SignInProfile, now: UnixSeconds) {
        self.renewed_at = Some(now);
        self.info = Some(profile);
    }

    pub fn delete_profile(&mut self) {
        self.info = None;
    }

    pub fn toggle_admin_mode(&mut self) {
        self.admin_mode = !self.admin_mode;
    }

    fn account_age(&self, now: UnixSeconds) -> Option<i64> {
        self.valid_profile(now)
            .filter(|p| p.create_at > 0)
            .map(|p| now - p.create_at)
    }
}
