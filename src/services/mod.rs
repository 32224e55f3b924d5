pub mod blob_uploader;
pub mod completion_poller;
pub mod control_plane;
pub mod fallback;
pub mod request_executor;
pub mod upload_pipeline;
