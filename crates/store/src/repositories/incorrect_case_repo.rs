//! Repository for reported mistranslation samples.

use sakura_core::incorrect_case::{CreateIncorrectCase, IncorrectCase};
use sakura_core::types::{new_entity_id, now_unix};

use crate::{SakuraStore, MAX_INCORRECT_CASES};

pub struct IncorrectCaseRepo;

impl IncorrectCaseRepo {
    /// Record a sample. Once [`MAX_INCORRECT_CASES`] are held the oldest is
    /// dropped.
    pub async fn create(
        pool: &SakuraStore,
        submitter: &str,
        input: CreateIncorrectCase,
    ) -> IncorrectCase {
        let case = IncorrectCase {
            id: new_entity_id(),
            provider_id: input.provider_id,
            novel_id: input.novel_id,
            chapter_id: input.chapter_id,
            jp: input.jp,
            zh: input.zh,
            submitter: submitter.to_string(),
            create_at: now_unix(),
        };

        let mut state = pool.state().write().await;
        if state.incorrect_cases.len() >= MAX_INCORRECT_CASES {
            state.incorrect_cases.pop_front();
        }
        state.incorrect_cases.push_back(case.clone());
        case
    }

    /// Samples, newest first.
    pub async fn list(pool: &SakuraStore, limit: usize) -> Vec<IncorrectCase> {
        pool.state()
            .read()
            .await
            .incorrect_cases
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}
