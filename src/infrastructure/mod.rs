use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::services::blob_uploader::BlobUploader;
use crate::services::control_plane::HttpControlPlane;
use crate::services::upload_pipeline::UploadPipeline;

/// Shared HTTP client for the control plane and the blob store. Timeouts are
/// enforced per call site, never on the client itself, so the three timeout
/// scopes stay independent.
pub fn http_client() -> IngestResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| IngestError::config(format!("failed to build HTTP client: {e}")))
}

/// Wire up a ready-to-use pipeline against the configured platform.
/// Configuration problems surface here, not on the first request.
pub fn setup_pipeline(config: IngestConfig) -> IngestResult<UploadPipeline> {
    let client = http_client()?;
    let control = HttpControlPlane::new(client.clone(), &config)?;
    let uploader = BlobUploader::from_config(client, &config);

    info!(
        "📦 Asset ingestion pipeline ready (platform: {}, max size: {}MB)",
        config.platform_url,
        config.max_file_size / 1024 / 1024
    );

    Ok(UploadPipeline::new(Arc::new(control), uploader, config))
}
