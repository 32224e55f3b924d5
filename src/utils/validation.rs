//! Caller-side preconditions checked before the pipeline runs. These are
//! plain single-shot checks; nothing here retries or talks to the network.

/// Maximum payload size accepted by the caller-facing contract: 10 MB
pub const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates payload size against the configured maximum and rejects empty
/// payloads outright.
pub fn validate_payload(payload: &[u8], max_size: usize) -> Result<(), ValidationError> {
    if payload.is_empty() {
        return Err(ValidationError {
            code: "EMPTY_PAYLOAD",
            message: "Payload is empty".to_string(),
        });
    }
    if payload.len() > max_size {
        return Err(ValidationError {
            code: "PAYLOAD_TOO_LARGE",
            message: format!(
                "Payload size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                payload.len(),
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Sanitizes a display name before it is sent to the platform: strips any
/// path components, replaces reserved characters and caps the length.
pub fn sanitize_display_name(name: &str) -> Result<String, ValidationError> {
    let name = std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Trim safely at a UTF-8 boundary
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() {
        return Err(ValidationError {
            code: "INVALID_NAME",
            message: "Display name cannot be empty".to_string(),
        });
    }

    Ok(sanitized)
}
