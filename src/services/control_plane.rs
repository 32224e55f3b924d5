use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::models::{ResourceStage, UploadCredential};
use crate::services::request_executor::RequestExecutor;

/// Server-side processing state reported by the status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    Pending,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResource {
    pub id: String,
    /// Provisional URL; replaced once processing completes
    pub url: Option<String>,
    pub upload: UploadCredential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub id: String,
    pub url: Option<String>,
    pub stage: ResourceStage,
    pub processing_state: ProcessingState,
    #[serde(default)]
    pub processing_error: Option<String>,
}

impl ResourceStatus {
    /// The resource URL, once processing has produced a non-empty one.
    pub fn ready_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn failed(&self) -> bool {
        self.processing_state == ProcessingState::Failed
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedResource {
    pub id: String,
    pub stage: ResourceStage,
}

/// The three control-plane operations of the provisioning protocol.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Register a new resource record and obtain its one-time upload
    /// credential. Failure here is fatal for the run.
    async fn create(
        &self,
        name: &str,
        content_type: &str,
        size: u64,
    ) -> IngestResult<CreatedResource>;

    /// Read-only processing-state poll.
    async fn status(&self, id: &str) -> IngestResult<ResourceStatus>;

    /// Single-attempt status fetch for best-effort call sites. Defaults to
    /// the regular fetch for implementations without a retry layer.
    async fn status_once(&self, id: &str) -> IngestResult<ResourceStatus> {
        self.status(id).await
    }

    /// Transition the resource DRAFT -> PUBLISHED.
    async fn publish(&self, id: &str) -> IngestResult<PublishedResource>;
}

const CREATE_ASSET: &str = r#"mutation CreateAsset($name: String!, $contentType: String!, $size: Int!) {
  assetCreate(name: $name, contentType: $contentType, size: $size) {
    id
    url
    upload {
      url
      key
      policy
      algorithm
      credentialId
      issuedAt
      signature
      securityToken
    }
  }
}"#;

const ASSET_STATUS: &str = r#"query AssetStatus($id: ID!) {
  asset(id: $id) {
    id
    url
    stage
    processingState
    processingError
  }
}"#;

const PUBLISH_ASSET: &str = r#"mutation PublishAsset($id: ID!) {
  assetPublish(id: $id) {
    id
    stage
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    #[serde(rename = "assetCreate")]
    asset_create: CreatedResource,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    asset: ResourceStatus,
}

#[derive(Debug, Deserialize)]
struct PublishData {
    #[serde(rename = "assetPublish")]
    asset_publish: PublishedResource,
}

/// HTTPS client for the managed content platform's query/mutation API.
///
/// Every call goes through the `RequestExecutor`; the `errors` array in the
/// response body is checked in addition to the HTTP status, since the
/// platform reports validation failures inside an HTTP 200.
#[derive(Debug)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    endpoint: Url,
    access_token: String,
    executor: RequestExecutor,
}

impl HttpControlPlane {
    /// Fails fast when the platform endpoint or bearer token is missing.
    /// That is a configuration error, not a runtime network error.
    pub fn new(client: reqwest::Client, config: &IngestConfig) -> IngestResult<Self> {
        if config.platform_url.trim().is_empty() {
            return Err(IngestError::config("PLATFORM_API_URL is not set"));
        }
        if config.access_token.trim().is_empty() {
            return Err(IngestError::config("PLATFORM_ACCESS_TOKEN is not set"));
        }
        let endpoint = Url::parse(&config.platform_url).map_err(|e| {
            IngestError::config(format!(
                "invalid platform URL '{}': {}",
                config.platform_url, e
            ))
        })?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
            executor: RequestExecutor::from_config(config),
        })
    }

    fn request(&self, query: &'static str, variables: serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        single_attempt: bool,
        query: &'static str,
        variables: serde_json::Value,
    ) -> IngestResult<T> {
        let response = if single_attempt {
            self.executor
                .execute_once(operation, || self.request(query, variables.clone()))
                .await?
        } else {
            self.executor
                .execute(operation, || self.request(query, variables.clone()))
                .await?
        };

        let body: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| IngestError::control_plane(operation, format!("malformed response: {e}")))?;

        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(IngestError::control_plane(operation, messages.join("; ")));
        }

        body.data
            .ok_or_else(|| IngestError::control_plane(operation, "response carried no data"))
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create(
        &self,
        name: &str,
        content_type: &str,
        size: u64,
    ) -> IngestResult<CreatedResource> {
        let data: CreateData = self
            .post(
                "create",
                false,
                CREATE_ASSET,
                json!({ "name": name, "contentType": content_type, "size": size }),
            )
            .await?;
        Ok(data.asset_create)
    }

    async fn status(&self, id: &str) -> IngestResult<ResourceStatus> {
        let data: StatusData = self
            .post("status", false, ASSET_STATUS, json!({ "id": id }))
            .await?;
        Ok(data.asset)
    }

    async fn status_once(&self, id: &str) -> IngestResult<ResourceStatus> {
        let data: StatusData = self
            .post("status", true, ASSET_STATUS, json!({ "id": id }))
            .await?;
        Ok(data.asset)
    }

    async fn publish(&self, id: &str) -> IngestResult<PublishedResource> {
        let data: PublishData = self
            .post("publish", false, PUBLISH_ASSET, json!({ "id": id }))
            .await?;
        Ok(data.asset_publish)
    }
}
