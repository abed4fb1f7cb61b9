//! Chapter storage the executor reads from and writes translations to.
//!
//! [`HttpNovelSource`] talks to the main novel API; [`MemoryNovelSource`]
//! keeps everything in process for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use sakura_core::task::TranslateTarget;
use tokio::sync::RwLock;

/// Errors from a novel source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The novel API returned a non-2xx status code.
    #[error("Novel API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The target or chapter does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Where chapters come from and where translations go.
#[async_trait]
pub trait NovelSource: Send + Sync {
    /// Chapter ids of `target`, in reading order.
    async fn chapters(&self, target: &TranslateTarget) -> Result<Vec<String>, SourceError>;

    /// Japanese lines of one chapter.
    async fn fetch(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
    ) -> Result<Vec<String>, SourceError>;

    /// Save the Sakura translation of one chapter.
    async fn store(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
        lines: &[String],
    ) -> Result<(), SourceError>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Novel source backed by the upstream REST API.
///
/// | Method | Path                                   | Body       |
/// |--------|----------------------------------------|------------|
/// | GET    | `{base}/{target}/chapters`             | `[id]`     |
/// | GET    | `{base}/{target}/chapters/{id}`        | `[line]`   |
/// | PUT    | `{base}/{target}/chapters/{id}/sakura` | `[line]`   |
pub struct HttpNovelSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNovelSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chapter_url(&self, target: &TranslateTarget, chapter_id: &str) -> String {
        format!("{}/{target}/chapters/{chapter_id}", self.base_url)
    }

    async fn ensure_success(
        response: reqwest::Response,
        what: String,
    ) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(what));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl NovelSource for HttpNovelSource {
    async fn chapters(&self, target: &TranslateTarget) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(format!("{}/{target}/chapters", self.base_url))
            .send()
            .await?;
        let ids = Self::ensure_success(response, target.to_string())
            .await?
            .json()
            .await?;
        Ok(ids)
    }

    async fn fetch(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
    ) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(self.chapter_url(target, chapter_id))
            .send()
            .await?;
        let lines = Self::ensure_success(response, format!("{target}/{chapter_id}"))
            .await?
            .json()
            .await?;
        Ok(lines)
    }

    async fn store(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
        lines: &[String],
    ) -> Result<(), SourceError> {
        let response = self
            .client
            .put(format!("{}/sakura", self.chapter_url(target, chapter_id)))
            .json(lines)
            .send()
            .await?;
        Self::ensure_success(response, format!("{target}/{chapter_id}")).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// `(chapter id, lines)` pairs in reading order.
pub type Chapters = Vec<(String, Vec<String>)>;

/// In-process novel source keyed by the target's display form.
#[derive(Default)]
pub struct MemoryNovelSource {
    novels: RwLock<HashMap<String, Chapters>>,
    translations: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl MemoryNovelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a novel's chapters, in reading order.
    pub async fn insert(&self, target: &TranslateTarget, chapters: Chapters) {
        self.novels.write().await.insert(target.to_string(), chapters);
    }

    /// The stored translation of a chapter, if one was written.
    pub async fn translation(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
    ) -> Option<Vec<String>> {
        self.translations
            .read()
            .await
            .get(&(target.to_string(), chapter_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl NovelSource for MemoryNovelSource {
    async fn chapters(&self, target: &TranslateTarget) -> Result<Vec<String>, SourceError> {
        let novels = self.novels.read().await;
        let chapters = novels
            .get(&target.to_string())
            .ok_or_else(|| SourceError::NotFound(target.to_string()))?;
        Ok(chapters.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn fetch(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
    ) -> Result<Vec<String>, SourceError> {
        let novels = self.novels.read().await;
        novels
            .get(&target.to_string())
            .and_then(|chapters| chapters.iter().find(|(id, _)| id == chapter_id))
            .map(|(_, lines)| lines.clone())
            .ok_or_else(|| SourceError::NotFound(format!("{target}/{chapter_id}")))
    }

    async fn store(
        &self,
        target: &TranslateTarget,
        chapter_id: &str,
        lines: &[String],
    ) -> Result<(), SourceError> {
        self.translations
            .write()
            .await
            .insert((target.to_string(), chapter_id.to_string()), lines.to_vec());
        Ok(())
    }
}
