//! User roles and their ordering.
//!
//! Roles form a total order: `banned < normal < trusted < maintainer < admin`.
//! Permission checks compare ranks through [`UserRole::at_least`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MAINTAINER: &str = "maintainer";
pub const ROLE_TRUSTED: &str = "trusted";
pub const ROLE_NORMAL: &str = "normal";
pub const ROLE_BANNED: &str = "banned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Maintainer,
    Trusted,
    Normal,
    Banned,
}

impl UserRole {
    /// Numeric rank used for ordering (`banned` = 0, `admin` = 4).
    pub fn rank(self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Maintainer => 3,
            Self::Trusted => 2,
            Self::Normal => 1,
            Self::Banned => 0,
        }
    }

    /// Whether this role is the same as or above `required`.
    pub fn at_least(self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Maintainer => ROLE_MAINTAINER,
            Self::Trusted => ROLE_TRUSTED,
            Self::Normal => ROLE_NORMAL,
            Self::Banned => ROLE_BANNED,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_MAINTAINER => Ok(Self::Maintainer),
            ROLE_TRUSTED => Ok(Self::Trusted),
            ROLE_NORMAL => Ok(Self::Normal),
            ROLE_BANNED => Ok(Self::Banned),
            other => Err(CoreError::Validation(format!("Unknown role: {other}"))),
        }
    }
}
