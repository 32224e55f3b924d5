pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use infrastructure::setup_pipeline;
pub use models::{PipelineResult, RemoteResourceHandle, ResourceStage, UploadRequest};
pub use services::upload_pipeline::UploadPipeline;
