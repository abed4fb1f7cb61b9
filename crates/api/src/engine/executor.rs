//! Runs one translation job against one worker's Sakura endpoint.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use sakura_core::error::CoreError;
use sakura_core::sakura::Job;
use sakura_core::task::SakuraTask;
use sakura_endpoint::{EndpointError, SakuraEndpoint};
use tokio_util::sync::CancellationToken;

use super::progress::ProgressReporter;
use super::source::{NovelSource, SourceError};

/// Everything a session hands to the executor.
pub struct ExecutionContext {
    pub job: Job,
    pub worker_id: String,
    pub endpoint: SakuraEndpoint,
    pub progress: ProgressReporter,
    /// Cancelled when the worker is stopped or deleted, the job is deleted,
    /// or the server shuts down.
    pub cancel: CancellationToken,
}

/// Why a job did not finish.
///
/// The dispatcher decides what happens next from the variant: endpoint
/// failures take the worker offline, every other failure drops the job.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Execution cancelled")]
    Cancelled,

    /// The worker's endpoint is unreachable or answering with errors.
    #[error("Endpoint failure: {0}")]
    Endpoint(EndpointError),

    /// The endpoint answered, but not with a usable translation.
    #[error("Unusable reply: {0}")]
    Reply(EndpointError),

    #[error("Novel source failure: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid task: {0}")]
    Task(#[from] CoreError),

    #[error("Executor panicked: {0}")]
    Panicked(String),
}

impl From<EndpointError> for ExecutionError {
    fn from(err: EndpointError) -> Self {
        if err.is_endpoint_fault() {
            Self::Endpoint(err)
        } else {
            Self::Reply(err)
        }
    }
}

/// Await `fut` unless `cancel` fires first.
async fn cancellable<T, E>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, ExecutionError>
where
    ExecutionError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
        result = fut => Ok(result?),
    }
}

/// Something that can carry out a queued job.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext) -> Result<(), ExecutionError>;
}

/// Translates every chapter of a task's target within its range.
pub struct SakuraExecutor {
    source: Arc<dyn NovelSource>,
}

impl SakuraExecutor {
    pub fn new(source: Arc<dyn NovelSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TaskExecutor for SakuraExecutor {
    async fn execute(&self, ctx: ExecutionContext) -> Result<(), ExecutionError> {
        let task: SakuraTask = ctx.job.task.parse()?;

        cancellable(&ctx.cancel, ctx.endpoint.probe()).await?;

        let chapters: Vec<String> = cancellable(&ctx.cancel, self.source.chapters(&task.target))
            .await?
            .into_iter()
            .enumerate()
            .filter(|(index, _)| task.range.contains(*index))
            .map(|(_, id)| id)
            .collect();

        let total = u32::try_from(chapters.len()).unwrap_or(u32::MAX);
        ctx.progress.report(total, 0).await;
        tracing::info!(
            job_id = %ctx.job.id,
            worker_id = %ctx.worker_id,
            task = %task,
            chapters = total,
            "Translation started",
        );

        for (finished, chapter_id) in (1u32..).zip(chapters.iter()) {
            let lines =
                cancellable(&ctx.cancel, self.source.fetch(&task.target, chapter_id)).await?;
            let translated = cancellable(&ctx.cancel, ctx.endpoint.translate(&lines)).await?;
            cancellable(
                &ctx.cancel,
                self.source.store(&task.target, chapter_id, &translated),
            )
            .await?;

            ctx.progress.report(total, finished).await;
            tracing::debug!(
                job_id = %ctx.job.id,
                chapter_id = %chapter_id,
                lines = lines.len(),
                "Chapter translated",
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unusable_replies_are_not_endpoint_failures() {
        let err: ExecutionError = EndpointError::LineMismatch {
            expected: 2,
            actual: 1,
        }
        .into();
        assert_matches!(err, ExecutionError::Reply(_));

        let err: ExecutionError = EndpointError::EmptyReply.into();
        assert_matches!(err, ExecutionError::Reply(_));

        let err: ExecutionError = EndpointError::ApiError {
            status: 503,
            body: "loading model".to_string(),
        }
        .into();
        assert_matches!(err, ExecutionError::Endpoint(_));
    }

    #[tokio::test]
    async fn cancellable_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable(&cancel, async { Ok::<_, SourceError>(1) }).await;
        assert_matches!(result, Err(ExecutionError::Cancelled));

        let result = cancellable(&CancellationToken::new(), async {
            Err::<(), _>(SourceError::NotFound("n1".to_string()))
        })
        .await;
        assert_matches!(result, Err(ExecutionError::Source(SourceError::NotFound(_))));
    }
}
