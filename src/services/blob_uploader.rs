use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tokio::time::timeout;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::models::{UploadCredential, UploadRequest};

/// Markers some blob-store backends embed in an HTTP 200 body when the
/// upload was actually rejected. Checked explicitly; the status code alone
/// is not trustworthy here.
const ERROR_MARKERS: [&str; 2] = ["<Error", "<ERROR"];

/// Streams a payload straight to the blob store using the one-time
/// pre-signed POST credential issued by the control plane.
///
/// The upload runs under its own timeout, distinct from the executor's
/// per-attempt timeout and the pipeline deadline, and is never retried: the
/// credential is single-use.
pub struct BlobUploader {
    client: reqwest::Client,
    upload_timeout: Duration,
}

impl BlobUploader {
    pub fn new(client: reqwest::Client, upload_timeout: Duration) -> Self {
        Self {
            client,
            upload_timeout,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &IngestConfig) -> Self {
        Self::new(client, config.upload_timeout)
    }

    /// The provider's pre-signed POST field sequence. The store reads the
    /// signed fields before it will accept the file, so the file part must
    /// come last. Absent optional fields are omitted entirely, never sent
    /// empty.
    pub fn credential_fields(credential: &UploadCredential) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("key", credential.key.clone()),
            ("policy", credential.policy.clone()),
            ("x-amz-algorithm", credential.algorithm.clone()),
            ("x-amz-credential", credential.credential_id.clone()),
            ("x-amz-date", credential.issued_at.clone()),
            ("x-amz-signature", credential.signature.clone()),
        ];
        if let Some(token) = &credential.security_token {
            fields.push(("x-amz-security-token", token.clone()));
        }
        fields
    }

    fn build_form(credential: &UploadCredential, request: &UploadRequest) -> IngestResult<Form> {
        let mut form = Form::new();
        for (name, value) in Self::credential_fields(credential) {
            form = form.text(name, value);
        }
        let part = Part::stream(reqwest::Body::from(request.payload.clone()))
            .file_name(request.display_name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| {
                IngestError::blob_store(format!(
                    "invalid content type '{}': {}",
                    request.content_type, e
                ))
            })?;
        Ok(form.part("file", part))
    }

    pub async fn upload(
        &self,
        credential: &UploadCredential,
        request: &UploadRequest,
    ) -> IngestResult<()> {
        let form = Self::build_form(credential, request)?;
        let target = credential.url.clone();

        tracing::debug!(
            target_url = %target,
            key = %credential.key,
            size = request.size(),
            "uploading payload to blob store"
        );

        let send = async {
            let response = self
                .client
                .post(&target)
                .multipart(form)
                .send()
                .await
                .map_err(|e| IngestError::blob_store(format!("upload request failed: {e}")))?;

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if !status.is_success() {
                return Err(IngestError::blob_store(format!(
                    "blob store returned {}: {}",
                    status,
                    snippet(&body)
                )));
            }
            if ERROR_MARKERS.iter().any(|marker| body.contains(marker)) {
                return Err(IngestError::blob_store(format!(
                    "error payload inside a {} response: {}",
                    status,
                    snippet(&body)
                )));
            }
            Ok(())
        };

        match timeout(self.upload_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(IngestError::UploadTimeout(self.upload_timeout)),
        }
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    let mut end = trimmed.len().min(200);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
