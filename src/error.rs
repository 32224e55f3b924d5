use std::time::Duration;

use thiserror::Error;

use crate::utils::validation::ValidationError;

pub type IngestResult<T> = Result<T, IngestError>;

/// Failures produced inside the ingestion pipeline.
///
/// None of these cross the `ingest()` boundary: the orchestrator folds every
/// variant into a `PipelineResult` with a single human-readable message.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Retry budget exhausted on a control-plane call.
    #[error("{operation} failed after {attempts} attempts: {reason}")]
    Transport {
        operation: &'static str,
        attempts: u32,
        reason: String,
    },

    /// The platform answered, but with an error payload. Never retried.
    #[error("content platform rejected {operation}: {message}")]
    ControlPlane {
        operation: &'static str,
        message: String,
    },

    /// The blob store rejected the payload. The credential is single-use, so
    /// this is terminal for the run.
    #[error("blob upload failed: {0}")]
    BlobStore(String),

    #[error("blob upload timed out after {0:?}")]
    UploadTimeout(Duration),

    /// Terminal processing failure reported while polling.
    #[error("processing failed: {0}")]
    Processing(String),

    #[error("pipeline deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl IngestError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn control_plane<S: Into<String>>(operation: &'static str, message: S) -> Self {
        Self::ControlPlane {
            operation,
            message: message.into(),
        }
    }

    pub fn blob_store<S: Into<String>>(reason: S) -> Self {
        Self::BlobStore(reason.into())
    }
}
