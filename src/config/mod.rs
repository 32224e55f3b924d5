use std::env;
use std::time::Duration;

/// Configuration for the asset-ingestion pipeline.
///
/// Injected explicitly at construction so tests can run with millisecond
/// budgets; nothing in the pipeline reads process-global state.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Content-platform API endpoint
    pub platform_url: String,

    /// Bearer credential for the control plane
    pub access_token: String,

    /// Maximum payload size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Per-attempt timeout inside the request executor (default: 30s)
    pub request_timeout: Duration,

    /// Maximum attempts per control-plane call (default: 3)
    pub max_request_attempts: u32,

    /// Base delay for the executor's exponential backoff (default: 100ms)
    pub retry_base_delay: Duration,

    /// Blob upload timeout, independent of every other scope (default: 20s)
    pub upload_timeout: Duration,

    /// Status-poll attempt budget (default: 15)
    pub poll_max_attempts: u32,

    /// Delay before the first poll attempt (default: 200ms)
    pub poll_initial_delay: Duration,

    /// Poll delay multiplier applied after every attempt, uncapped (default: 1.5)
    pub poll_backoff_factor: f64,

    /// Overall deadline racing the whole pipeline (default: 90s)
    pub pipeline_deadline: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            platform_url: String::new(),
            access_token: String::new(),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            request_timeout: Duration::from_secs(30),
            max_request_attempts: 3,
            retry_base_delay: Duration::from_millis(100),
            upload_timeout: Duration::from_secs(20),
            poll_max_attempts: 15,
            poll_initial_delay: Duration::from_millis(200),
            poll_backoff_factor: 1.5,
            pipeline_deadline: Duration::from_secs(90),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            platform_url: env::var("PLATFORM_API_URL").unwrap_or(default.platform_url),

            access_token: env::var("PLATFORM_ACCESS_TOKEN").unwrap_or(default.access_token),

            max_file_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            request_timeout: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),

            max_request_attempts: env::var("RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_request_attempts),

            retry_base_delay: env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.retry_base_delay),

            upload_timeout: env::var("UPLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.upload_timeout),

            poll_max_attempts: env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_max_attempts),

            poll_initial_delay: env::var("POLL_INITIAL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.poll_initial_delay),

            poll_backoff_factor: env::var("POLL_BACKOFF_FACTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_backoff_factor),

            pipeline_deadline: env::var("PIPELINE_DEADLINE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.pipeline_deadline),
        }
    }
}
