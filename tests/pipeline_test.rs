use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asset_ingest::config::IngestConfig;
use asset_ingest::error::{IngestError, IngestResult};
use asset_ingest::models::{ResourceStage, UploadCredential, UploadRequest};
use asset_ingest::services::blob_uploader::BlobUploader;
use asset_ingest::services::control_plane::{
    ControlPlane, CreatedResource, ProcessingState, PublishedResource, ResourceStatus,
};
use asset_ingest::services::upload_pipeline::UploadPipeline;

const ASSET_ID: &str = "abc123";
const CDN_URL: &str = "https://cdn.example.com/abc123.jpg";

/// Scripted control plane, counting calls the way the real one would see
/// them. `ready_on_status_call` is the 1-based status call that first
/// reports a URL; `None` means processing never completes.
struct MockControlPlane {
    blob_url: String,
    ready_on_status_call: Option<u32>,
    fail_processing: bool,
    publish_ok: bool,
    create_delay: Option<Duration>,
    create_calls: AtomicU32,
    status_calls: AtomicU32,
    publish_calls: AtomicU32,
}

impl MockControlPlane {
    fn new(blob_url: &str) -> Self {
        Self {
            blob_url: blob_url.to_string(),
            ready_on_status_call: None,
            fail_processing: false,
            publish_ok: true,
            create_delay: None,
            create_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            publish_calls: AtomicU32::new(0),
        }
    }

    fn ready_on(mut self, call: u32) -> Self {
        self.ready_on_status_call = Some(call);
        self
    }

    fn failing_processing(mut self) -> Self {
        self.fail_processing = true;
        self
    }

    fn failing_publish(mut self) -> Self {
        self.publish_ok = false;
        self
    }

    fn slow_create(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    fn credential(&self) -> UploadCredential {
        UploadCredential {
            url: self.blob_url.clone(),
            key: format!("uploads/{ASSET_ID}"),
            policy: "eyJjb25kaXRpb25zIjpbXX0=".to_string(),
            algorithm: "AWS4-HMAC-SHA256".to_string(),
            credential_id: "AKIAEXAMPLE/20250801/us-east-1/s3/aws4_request".to_string(),
            issued_at: "20250801T120000Z".to_string(),
            signature: "deadbeef".to_string(),
            security_token: None,
        }
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn create(
        &self,
        _name: &str,
        _content_type: &str,
        _size: u64,
    ) -> IngestResult<CreatedResource> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(CreatedResource {
            id: ASSET_ID.to_string(),
            url: None,
            upload: self.credential(),
        })
    }

    async fn status(&self, id: &str) -> IngestResult<ResourceStatus> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_processing {
            return Ok(ResourceStatus {
                id: id.to_string(),
                url: None,
                stage: ResourceStage::Draft,
                processing_state: ProcessingState::Failed,
                processing_error: Some("transcode failed".to_string()),
            });
        }
        let ready = self.ready_on_status_call.is_some_and(|n| call >= n);
        Ok(ResourceStatus {
            id: id.to_string(),
            url: ready.then(|| CDN_URL.to_string()),
            stage: ResourceStage::Draft,
            processing_state: if ready {
                ProcessingState::Ready
            } else {
                ProcessingState::Processing
            },
            processing_error: None,
        })
    }

    async fn publish(&self, id: &str) -> IngestResult<PublishedResource> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        if self.publish_ok {
            Ok(PublishedResource {
                id: id.to_string(),
                stage: ResourceStage::Published,
            })
        } else {
            Err(IngestError::Transport {
                operation: "publish",
                attempts: 3,
                reason: "unexpected status 502 Bad Gateway".to_string(),
            })
        }
    }
}

fn test_config() -> IngestConfig {
    IngestConfig {
        platform_url: "https://platform.example.com/graphql".to_string(),
        access_token: "test-token".to_string(),
        retry_base_delay: Duration::from_millis(1),
        poll_initial_delay: Duration::from_millis(1),
        poll_backoff_factor: 1.0,
        upload_timeout: Duration::from_secs(5),
        pipeline_deadline: Duration::from_secs(10),
        ..IngestConfig::default()
    }
}

fn jpeg_request(len: usize) -> UploadRequest {
    let mut payload = vec![0xFF, 0xD8, 0xFF, 0xE0];
    payload.resize(len, 0);
    UploadRequest::new(payload, "photo.jpg", "image/jpeg")
}

async fn blob_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    server
}

fn pipeline(control: Arc<MockControlPlane>, config: IngestConfig) -> UploadPipeline {
    let uploader = BlobUploader::new(reqwest::Client::new(), config.upload_timeout);
    UploadPipeline::new(control, uploader, config)
}

#[tokio::test]
async fn test_happy_path_polls_then_publishes() {
    let server = blob_server().await;
    // Call 1 is the fast-path check, calls 2-4 come from the poller
    let control = Arc::new(MockControlPlane::new(&format!("{}/blob", server.uri())).ready_on(4));
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    let asset = result.asset().expect("pipeline should succeed");
    assert_eq!(asset.id, ASSET_ID);
    assert_eq!(asset.stage, ResourceStage::Published);
    assert_eq!(asset.url.as_deref(), Some(CDN_URL));
    assert_eq!(control.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 4);
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fast_path_skips_poller_entirely() {
    let server = blob_server().await;
    let control = Arc::new(MockControlPlane::new(&format!("{}/blob", server.uri())).ready_on(1));
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    assert!(result.is_success());
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 1);
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_processing_failure_aborts_immediately() {
    let server = blob_server().await;
    let control =
        Arc::new(MockControlPlane::new(&format!("{}/blob", server.uri())).failing_processing());
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("transcode failed"));
    // Fast-path check plus the first poll attempt; the remaining budget is
    // not spent and nothing is published
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 2);
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_poll_exhaustion_still_yields_usable_asset() {
    let server = blob_server().await;
    let control = Arc::new(MockControlPlane::new(&format!("{}/blob", server.uri())));
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    // The platform never confirmed processing, but upload succeeded, so the
    // caller still gets the asset back in its last known stage
    let asset = result.asset().expect("fallback should still succeed");
    assert_eq!(asset.id, ASSET_ID);
    assert_eq!(asset.stage, ResourceStage::Draft);

    // 1 fast-path check + 15 poll attempts + 1 fallback fetch
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 17);
    // No URL ever appeared, so the fallback publish was not attempted
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fallback_publishes_when_url_appears_late() {
    let server = blob_server().await;
    // URL appears only on the fallback's own status fetch (call 17)
    let control = Arc::new(MockControlPlane::new(&format!("{}/blob", server.uri())).ready_on(17));
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    let asset = result.asset().expect("fallback should still succeed");
    assert_eq!(asset.stage, ResourceStage::Published);
    assert_eq!(asset.url.as_deref(), Some(CDN_URL));
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 17);
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_publish_failure_degrades_to_draft() {
    let server = blob_server().await;
    let control = Arc::new(
        MockControlPlane::new(&format!("{}/blob", server.uri()))
            .ready_on(1)
            .failing_publish(),
    );
    let result = pipeline(control.clone(), test_config())
        .ingest(jpeg_request(1024))
        .await;

    let asset = result.asset().expect("upload succeeded, so the run must too");
    assert_eq!(asset.stage, ResourceStage::Draft);
    assert_eq!(asset.url.as_deref(), Some(CDN_URL));
    // Two publish attempts at the call site, one more from the fallback
    assert_eq!(control.publish_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_deadline_cuts_off_mid_create() {
    let control = Arc::new(
        MockControlPlane::new("http://127.0.0.1:1/blob").slow_create(Duration::from_millis(500)),
    );
    let config = IngestConfig {
        pipeline_deadline: Duration::from_millis(50),
        ..test_config()
    };
    let result = pipeline(control.clone(), config).ingest(jpeg_request(1024)).await;

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("deadline"));
    // The blob store was never reached
    assert_eq!(control.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_payload_rejected_before_pipeline() {
    let control = Arc::new(MockControlPlane::new("http://127.0.0.1:1/blob"));
    let result = pipeline(control.clone(), test_config())
        .ingest(UploadRequest::new(Vec::<u8>::new(), "empty.bin", "application/octet-stream"))
        .await;

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("EMPTY_PAYLOAD"));
    assert_eq!(control.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversize_payload_rejected_before_pipeline() {
    let control = Arc::new(MockControlPlane::new("http://127.0.0.1:1/blob"));
    let config = IngestConfig {
        max_file_size: 1024,
        ..test_config()
    };
    let result = pipeline(control.clone(), config).ingest(jpeg_request(2048)).await;

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("PAYLOAD_TOO_LARGE"));
    assert_eq!(control.create_calls.load(Ordering::SeqCst), 0);
}
