use thiserror::Error;

/// Longest upstream error body kept in [`NarrativeError::UpstreamStatus`].
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors returned by the Gemini client.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model is rate limited or overloaded (HTTP 429 or 503). Worth retrying later.
    #[error("narrative model overloaded (HTTP {status})")]
    Overloaded { status: u16 },

    /// Any other non-success status.
    #[error("narrative model returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The response had no candidate text.
    #[error("narrative model response contained no text")]
    MissingText,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The session summary could not be rendered into the prompt.
    #[error("failed to encode prompt data: {0}")]
    Prompt(#[source] serde_json::Error),

    /// The configured base URL or model name does not form a valid URL.
    #[error("invalid Gemini URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl NarrativeError {
    /// `true` when the upstream signalled overload; callers may offer a retry hint.
    #[must_use]
    pub fn is_overloaded(&self) -> bool {
        matches!(self, NarrativeError::Overloaded { .. })
    }
}

/// Keep at most [`MAX_ERROR_BODY_CHARS`] characters of an error body.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
}
