use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::models::{PipelineResult, RemoteResourceHandle, ResourceStage, UploadRequest};
use crate::services::blob_uploader::BlobUploader;
use crate::services::completion_poller::{CompletionPoller, PollOutcome};
use crate::services::control_plane::{ControlPlane, PublishedResource, ResourceStatus};
use crate::services::fallback::FallbackResolver;
use crate::utils::validation;

/// Coordinates one full provisioning run: create the resource record, stream
/// the payload to the blob store, wait for processing, publish. The whole
/// sequence races the overall pipeline deadline; expiry anywhere wins the
/// race and the in-flight stage is dropped, not awaited.
pub struct UploadPipeline {
    control: Arc<dyn ControlPlane>,
    uploader: BlobUploader,
    poller: CompletionPoller,
    fallback: FallbackResolver,
    config: IngestConfig,
}

impl UploadPipeline {
    pub fn new(
        control: Arc<dyn ControlPlane>,
        uploader: BlobUploader,
        config: IngestConfig,
    ) -> Self {
        let poller = CompletionPoller::new(control.clone(), &config);
        let fallback = FallbackResolver::new(control.clone());
        Self {
            control,
            uploader,
            poller,
            fallback,
            config,
        }
    }

    /// Caller-facing entry point. Validates the payload, runs the pipeline
    /// under the overall deadline, and folds every failure into a
    /// `PipelineResult`; no error value escapes this boundary.
    pub async fn ingest(&self, request: UploadRequest) -> PipelineResult {
        let request = match self.validated(request) {
            Ok(request) => request,
            Err(e) => return PipelineResult::failure(e.to_string()),
        };

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            name = %request.display_name,
            size = request.size(),
            content_type = %request.content_type,
            "starting ingestion pipeline"
        );

        match timeout(self.config.pipeline_deadline, self.run(&request)).await {
            Ok(Ok(asset)) => {
                tracing::info!(%run_id, id = %asset.id, stage = ?asset.stage, "pipeline finished");
                PipelineResult::success(asset)
            }
            Ok(Err(e)) => {
                tracing::warn!(%run_id, error = %e, "pipeline failed");
                PipelineResult::failure(e.to_string())
            }
            Err(_) => {
                let e = IngestError::DeadlineExceeded(self.config.pipeline_deadline);
                tracing::warn!(%run_id, "pipeline deadline exceeded");
                PipelineResult::failure(e.to_string())
            }
        }
    }

    fn validated(&self, mut request: UploadRequest) -> IngestResult<UploadRequest> {
        validation::validate_payload(&request.payload, self.config.max_file_size)?;
        request.display_name = validation::sanitize_display_name(&request.display_name)?;
        Ok(request)
    }

    async fn run(&self, request: &UploadRequest) -> IngestResult<RemoteResourceHandle> {
        // 1. Register the resource record. Failure here is fatal; no blob
        //    upload is attempted.
        let created = self
            .control
            .create(&request.display_name, &request.content_type, request.size())
            .await?;
        let mut handle = RemoteResourceHandle {
            id: created.id.clone(),
            display_name: request.display_name.clone(),
            url: created.url.clone(),
            content_type: request.content_type.clone(),
            size: request.size(),
            stage: ResourceStage::Draft,
            created_at: Utc::now(),
        };
        tracing::debug!(id = %handle.id, "resource record created");

        // 2. Stream the payload straight to the blob store. A rejection here
        //    is terminal; the credential is single-use.
        self.uploader.upload(&created.upload, request).await?;

        // 3. Fast path: one best-effort check catches resources that finish
        //    processing immediately. Failures here are ignored.
        let instantly_ready = match self.control.status_once(&handle.id).await {
            Ok(status) if status.ready_url().is_some() => {
                apply_status(&mut handle, &status);
                true
            }
            _ => false,
        };

        // 4. Wait out asynchronous processing.
        if !instantly_ready {
            match self.poller.wait_for_ready(&handle.id).await {
                PollOutcome::Ready(status) => apply_status(&mut handle, &status),
                PollOutcome::Failed(reason) => return Err(IngestError::Processing(reason)),
                PollOutcome::Exhausted => {
                    return Ok(self.fallback.resolve(handle).await.into_handle());
                }
            }
        }

        // 5. Publish, with one extra attempt at this call site on top of the
        //    executor's own retries.
        match self.publish_with_retry(&handle.id).await {
            Ok(published) => {
                handle.stage.advance(published.stage);
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(id = %handle.id, error = %e, "publish failed after polling, entering fallback");
                Ok(self.fallback.resolve(handle).await.into_handle())
            }
        }
    }

    async fn publish_with_retry(&self, id: &str) -> IngestResult<PublishedResource> {
        match self.control.publish(id).await {
            Ok(published) => Ok(published),
            Err(first) => {
                tracing::warn!(id, error = %first, "publish failed, retrying once");
                self.control.publish(id).await
            }
        }
    }
}

fn apply_status(handle: &mut RemoteResourceHandle, status: &ResourceStatus) {
    if let Some(url) = status.ready_url() {
        handle.url = Some(url.to_string());
    }
    handle.stage.advance(status.stage);
}
