use thiserror::Error;

/// Longest upstream error body kept in [`MonitorError::UpstreamStatus`].
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors returned by the live-monitor client.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("monitor service returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL could not be parsed.
    #[error("invalid monitor base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Keep at most [`MAX_ERROR_BODY_CHARS`] characters of an error body.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_caps_length_on_char_boundaries() {
        let long = "é".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("  not found \n"), "not found");
    }
}
