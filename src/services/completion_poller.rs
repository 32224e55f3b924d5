use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::IngestConfig;
use crate::services::control_plane::{ControlPlane, ResourceStatus};

/// Outcome of waiting for server-side processing.
#[derive(Debug)]
pub enum PollOutcome {
    /// Processing finished; the status carries a dereferenceable URL.
    Ready(ResourceStatus),
    /// The platform reported a terminal processing failure.
    Failed(String),
    /// The attempt budget was spent without confirmation either way. Not an
    /// error: the orchestrator routes this to the fallback resolver.
    Exhausted,
}

/// Repeatedly queries resource status until the resource is confirmed ready,
/// confirmed failed, or the attempt budget runs out.
///
/// The delay before each attempt starts small and multiplies after every
/// attempt; it is never capped. The pipeline deadline bounds the total wait.
pub struct CompletionPoller {
    control: Arc<dyn ControlPlane>,
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
}

impl CompletionPoller {
    pub fn new(control: Arc<dyn ControlPlane>, config: &IngestConfig) -> Self {
        Self {
            control,
            max_attempts: config.poll_max_attempts,
            initial_delay: config.poll_initial_delay,
            backoff_factor: config.poll_backoff_factor,
        }
    }

    pub async fn wait_for_ready(&self, id: &str) -> PollOutcome {
        let mut delay = self.initial_delay;

        for attempt in 1..=self.max_attempts {
            sleep(delay).await;
            delay = delay.mul_f64(self.backoff_factor);

            match self.control.status(id).await {
                Ok(status) if status.ready_url().is_some() => {
                    tracing::debug!(id, attempt, "resource ready");
                    return PollOutcome::Ready(status);
                }
                Ok(status) if status.failed() => {
                    let reason = status
                        .processing_error
                        .unwrap_or_else(|| "platform reported a processing failure".to_string());
                    tracing::warn!(id, attempt, %reason, "processing failed, aborting poll");
                    return PollOutcome::Failed(reason);
                }
                Ok(_) => {
                    tracing::debug!(id, attempt, max_attempts = self.max_attempts, "still processing");
                }
                // A transient plane outage consumes the attempt but must not
                // abort the wait.
                Err(e) => {
                    tracing::warn!(id, attempt, error = %e, "status poll failed");
                }
            }
        }

        tracing::warn!(id, attempts = self.max_attempts, "poll budget exhausted");
        PollOutcome::Exhausted
    }
}
