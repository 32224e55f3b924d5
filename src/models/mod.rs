use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One binary payload headed for the content platform.
///
/// Owned by a single pipeline run and discarded afterwards; the pipeline
/// never mutates the payload itself.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub payload: Bytes,
    pub display_name: String,
    pub content_type: String,
}

impl UploadRequest {
    pub fn new(
        payload: impl Into<Bytes>,
        display_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            display_name: display_name.into(),
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Signed pre-signed-POST fields issued by the control plane for exactly one
/// resource. Single use: the blob store validates the embedded signature, so
/// a rejected credential cannot be retried without re-issuing it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredential {
    /// Blob-store target URL for the multipart POST
    pub url: String,
    /// Storage key the payload lands under
    pub key: String,
    /// Base64 access policy document
    pub policy: String,
    /// Signing algorithm identifier
    pub algorithm: String,
    /// Identifier of the signing credential
    pub credential_id: String,
    /// Issue timestamp, in the signed form the store expects
    pub issued_at: String,
    pub signature: String,
    /// Present only for temporary-credential sessions
    #[serde(default)]
    pub security_token: Option<String>,
}

/// Lifecycle stage of a remote resource.
///
/// Transitions are monotonic: DRAFT moves to PUBLISHED and never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStage {
    Draft,
    Published,
}

impl ResourceStage {
    /// Move forward to `next` if it is ahead of the current stage.
    pub fn advance(&mut self, next: ResourceStage) {
        if next > *self {
            *self = next;
        }
    }
}

/// The control plane's record of an uploaded asset, enriched as the pipeline
/// learns more: polling fills in the URL, publish advances the stage.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteResourceHandle {
    pub id: String,
    pub display_name: String,
    pub url: Option<String>,
    pub content_type: String,
    pub size: u64,
    pub stage: ResourceStage,
    pub created_at: DateTime<Utc>,
}

/// Terminal outcome of one pipeline run. This is the only value callers ever
/// receive; errors never escape the pipeline boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineResult {
    Success { asset: RemoteResourceHandle },
    Failure { error: String },
}

impl PipelineResult {
    pub fn success(asset: RemoteResourceHandle) -> Self {
        Self::Success { asset }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn asset(&self) -> Option<&RemoteResourceHandle> {
        match self {
            Self::Success { asset } => Some(asset),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}
