use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};

/// Executes one logical control-plane call with bounded retries and
/// exponential backoff.
///
/// Any non-success HTTP status counts as a failed attempt, as does an
/// attempt that outlives the per-attempt timeout (the in-flight request is
/// dropped, not awaited). The delay between attempt `i` and `i+1` is
/// `base_delay * 2^i`, with no jitter and no cap.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    max_attempts: u32,
    base_delay: Duration,
    attempt_timeout: Duration,
}

impl RequestExecutor {
    pub fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.max_request_attempts,
            config.retry_base_delay,
            config.request_timeout,
        )
    }

    /// Run `build()` until it yields a success response or the attempt
    /// budget is spent, returning the last observed failure in that case.
    pub async fn execute<F>(
        &self,
        operation: &'static str,
        build: F,
    ) -> IngestResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        self.execute_with_attempts(operation, self.max_attempts, build)
            .await
    }

    /// Single-attempt variant for best-effort call sites.
    pub async fn execute_once<F>(
        &self,
        operation: &'static str,
        build: F,
    ) -> IngestResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        self.execute_with_attempts(operation, 1, build).await
    }

    async fn execute_with_attempts<F>(
        &self,
        operation: &'static str,
        max_attempts: u32,
        build: F,
    ) -> IngestResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let max_attempts = max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(operation, attempt, ?delay, "backing off before retry");
                sleep(delay).await;
            }

            match timeout(self.attempt_timeout, build().send()).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    if attempt > 0 {
                        tracing::info!(
                            operation,
                            attempt = attempt + 1,
                            "call succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Ok(Ok(response)) => {
                    last_failure = format!("unexpected status {}", response.status());
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        status = %response.status(),
                        "non-success response"
                    );
                }
                Ok(Err(e)) => {
                    last_failure = e.to_string();
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "request failed"
                    );
                }
                Err(_) => {
                    last_failure = format!("attempt timed out after {:?}", self.attempt_timeout);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        timeout = ?self.attempt_timeout,
                        "attempt aborted on timeout"
                    );
                }
            }
        }

        Err(IngestError::Transport {
            operation,
            attempts: max_attempts,
            reason: last_failure,
        })
    }
}
