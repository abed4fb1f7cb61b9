//! Mistranslation samples reported against web novel chapters.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, UnixSeconds};

/// Longest accepted `jp` / `zh` excerpt, in characters.
pub const MAX_EXCERPT_LEN: usize = 4096;

const MAX_ID_LEN: usize = 256;

/// Body of `POST /sakura/incorrect-case`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncorrectCase {
    pub provider_id: String,
    pub novel_id: String,
    pub chapter_id: String,
    pub jp: String,
    pub zh: String,
}

/// A recorded sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncorrectCase {
    pub id: EntityId,
    pub provider_id: String,
    pub novel_id: String,
    pub chapter_id: String,
    pub jp: String,
    pub zh: String,
    pub submitter: String,
    pub create_at: UnixSeconds,
}

pub fn validate_incorrect_case(input: &CreateIncorrectCase) -> Result<(), CoreError> {
    for (field, value) in [
        ("providerId", &input.provider_id),
        ("novelId", &input.novel_id),
        ("chapterId", &input.chapter_id),
    ] {
        if value.is_empty() || value.len() > MAX_ID_LEN {
            return Err(CoreError::Validation(format!(
                "{field} must be 1..={MAX_ID_LEN} characters"
            )));
        }
    }
    for (field, value) in [("jp", &input.jp), ("zh", &input.zh)] {
        if value.trim().is_empty() {
            return Err(CoreError::Validation(format!("{field} must not be empty")));
        }
        if value.chars().count() > MAX_EXCERPT_LEN {
            return Err(CoreError::Validation(format!(
                "{field} must not exceed {MAX_EXCERPT_LEN} characters"
            )));
        }
    }
    Ok(())
}
