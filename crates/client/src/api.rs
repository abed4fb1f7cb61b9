//! REST client for the `/api/sakura` endpoints.
//!
//! Every call returns a `Result`: network failures and non-2xx responses are
//! values, never panics.

use reqwest::{Method, RequestBuilder};
use sakura_core::error::CoreError;
use sakura_core::incorrect_case::{CreateIncorrectCase, IncorrectCase};
use sakura_core::sakura::{CreateWorker, SakuraStatus};
use sakura_core::session::UserSession;
use sakura_core::task::{SakuraTask, TranslateRange};
use sakura_core::types::UnixSeconds;

/// HTTP client for one Sakura dispatch server.
#[derive(Clone)]
pub struct SakuraClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Errors from the client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Sakura API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body (the server's `{"error","code"}` JSON).
        body: String,
    },

    /// The task would be rejected by the server; nothing was sent.
    #[error("Invalid task: {0}")]
    InvalidTask(#[from] CoreError),
}

impl SakuraClient {
    /// Create an anonymous client.
    ///
    /// * `base_url` - Server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attach the session's token, but only while its profile is valid at
    /// `now`. An expired session leaves the client anonymous.
    pub fn with_session(mut self, session: &UserSession, now: UnixSeconds) -> Self {
        self.token = session.token(now).map(str::to_string);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // ---- status ----

    /// GET /api/sakura
    pub async fn get_status(&self) -> Result<SakuraStatus, ClientError> {
        let response = self.send(self.request(Method::GET, "sakura")).await?;
        Ok(response.json().await?)
    }

    // ---- jobs ----

    /// POST /api/sakura/job with a raw task string. Returns the job id.
    pub async fn create_job(&self, task: &str) -> Result<String, ClientError> {
        let builder = self
            .request(Method::POST, "sakura/job")
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(task.to_string());
        self.send_text(builder).await
    }

    /// Queue a web novel translation over `range`.
    pub async fn create_job_web_translate(
        &self,
        provider_id: &str,
        novel_id: &str,
        range: TranslateRange,
    ) -> Result<String, ClientError> {
        self.submit_task(SakuraTask::web(provider_id, novel_id, range))
            .await
    }

    /// Queue a wenku volume translation over `range`.
    pub async fn create_job_wenku_translate(
        &self,
        novel_id: &str,
        volume_id: &str,
        range: TranslateRange,
    ) -> Result<String, ClientError> {
        self.submit_task(SakuraTask::wenku(novel_id, volume_id, range))
            .await
    }

    /// DELETE /api/sakura/job/{id}
    pub async fn delete_job(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("sakura/job/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    // ---- workers ----

    /// POST /api/sakura/worker. Returns the worker id.
    pub async fn create_worker(&self, input: &CreateWorker) -> Result<String, ClientError> {
        let builder = self.request(Method::POST, "sakura/worker").json(input);
        self.send_text(builder).await
    }

    /// DELETE /api/sakura/worker/{id}
    pub async fn delete_worker(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("sakura/worker/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    /// POST /api/sakura/worker/{id}/start
    pub async fn start_worker(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("sakura/worker/{id}/start");
        self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    /// POST /api/sakura/worker/{id}/stop
    pub async fn stop_worker(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("sakura/worker/{id}/stop");
        self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    // ---- incorrect cases ----

    /// POST /api/sakura/incorrect-case. Returns the sample id.
    pub async fn create_incorrect_case(
        &self,
        input: &CreateIncorrectCase,
    ) -> Result<String, ClientError> {
        let builder = self.request(Method::POST, "sakura/incorrect-case").json(input);
        self.send_text(builder).await
    }

    /// GET /api/sakura/incorrect-case, newest first.
    pub async fn list_incorrect_cases(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<IncorrectCase>, ClientError> {
        let mut builder = self.request(Method::GET, "sakura/incorrect-case");
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    // ---- private helpers ----

    /// Check the task the way the server will, then submit its canonical
    /// form.
    async fn submit_task(&self, task: SakuraTask) -> Result<String, ClientError> {
        let body = task.to_string();
        body.parse::<SakuraTask>()?;
        self.create_job(&body).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/api/{path}", self.base_url));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_text(&self, builder: RequestBuilder) -> Result<String, ClientError> {
        Ok(self.send(builder).await?.text().await?)
    }

    /// Send a request and turn non-2xx responses into
    /// [`ClientError::Api`].
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::debug!(status = status.as_u16(), body = %body, "Sakura API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
