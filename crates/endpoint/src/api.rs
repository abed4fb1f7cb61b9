//! REST client for a worker's Sakura endpoint.
//!
//! Wraps the OpenAI-compatible HTTP API (model listing, chat completions)
//! using [`reqwest`].

use crate::prompt::{self, ChatResponse};

/// HTTP client for a single Sakura endpoint.
#[derive(Clone)]
pub struct SakuraEndpoint {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the endpoint layer.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("Sakura endpoint error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The completion contained no choices.
    #[error("Sakura endpoint returned no completion")]
    EmptyReply,

    /// The model merged or split lines.
    #[error("Expected {expected} translated lines, got {actual}")]
    LineMismatch { expected: usize, actual: usize },
}

impl EndpointError {
    /// Whether the endpoint itself is at fault (unreachable, timed out or
    /// answering with an error status), as opposed to a reply that could not
    /// be used for the text that was sent.
    pub fn is_endpoint_fault(&self) -> bool {
        matches!(self, Self::Request(_) | Self::ApiError { .. })
    }
}

impl SakuraEndpoint {
    /// Create a new client for an endpoint.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8080`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (connection pooling across workers). Request timeouts come from
    /// that client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the endpoint is reachable and serving models.
    pub async fn probe(&self) -> Result<(), EndpointError> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Translate `lines` from Japanese to Chinese.
    ///
    /// Blank lines are passed through untouched; the rest are sent in
    /// batches (see [`prompt::batches`]). The output has exactly one line
    /// per input line.
    pub async fn translate(&self, lines: &[String]) -> Result<Vec<String>, EndpointError> {
        let (indices, text): (Vec<usize>, Vec<String>) = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i, line.clone()))
            .unzip();

        let mut translated = Vec::with_capacity(text.len());
        for batch in prompt::batches(&text) {
            translated.extend(self.translate_batch(batch).await?);
        }

        let mut out = lines.to_vec();
        for (index, line) in indices.into_iter().zip(translated) {
            out[index] = line;
        }
        Ok(out)
    }

    /// Send one batch and check the reply keeps the line count.
    async fn translate_batch(&self, lines: &[String]) -> Result<Vec<String>, EndpointError> {
        let request = prompt::chat_request(lines);
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await?;
        let reply: ChatResponse = Self::ensure_success(response).await?.json().await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .ok_or(EndpointError::EmptyReply)?
            .message
            .content;
        let out = prompt::split_reply(&content);
        if out.len() != lines.len() {
            tracing::warn!(
                endpoint = %self.base_url,
                expected = lines.len(),
                actual = out.len(),
                "Sakura reply line count mismatch",
            );
            return Err(EndpointError::LineMismatch {
                expected: lines.len(),
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or an [`EndpointError::ApiError`] with the status
    /// and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, EndpointError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EndpointError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
