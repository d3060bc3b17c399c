//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use livepulse_analytics::{NarrativeGenerator, NarrativeInput};
use reqwest::{Client, StatusCode, Url};

use crate::error::{truncate_body, NarrativeError};
use crate::prompt::build_prompt;
use crate::retry::retry_with_backoff;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for Gemini text generation.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client pointed at the public Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, NarrativeError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`NarrativeError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("livepulse/0.1 (live-analytics)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| NarrativeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: parsed,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` and returns the first candidate's text, retrying
    /// transient failures.
    ///
    /// # Errors
    ///
    /// - [`NarrativeError::Overloaded`] on HTTP 429/503 once retries are exhausted.
    /// - [`NarrativeError::UpstreamStatus`] on any other non-2xx status.
    /// - [`NarrativeError::MissingText`] if no candidate text is present.
    /// - [`NarrativeError::Http`] / [`NarrativeError::Deserialize`] on
    ///   transport or decoding failures.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, NarrativeError> {
        let url = self.build_url()?;
        let request = GenerateContentRequest::from_text(prompt);
        let text = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.generate_once(&url, &request)
        })
        .await?;
        tracing::info!(model = %self.model, chars = text.len(), "narrative generated");
        Ok(text)
    }

    /// Builds `{base}/v1beta/models/{model}:generateContent`. The key is sent
    /// as a header and must never appear in the URL.
    fn build_url(&self) -> Result<Url, NarrativeError> {
        let path = format!("v1beta/models/{}:generateContent", self.model);
        self.base_url
            .join(&path)
            .map_err(|e| NarrativeError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    async fn generate_once(
        &self,
        url: &Url,
        request: &GenerateContentRequest,
    ) -> Result<String, NarrativeError> {
        let response = self
            .client
            .post(url.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| NarrativeError::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NarrativeError::Http(e.without_url()))?;

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(NarrativeError::Overloaded {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Gemini returned an error status");
            return Err(NarrativeError::UpstreamStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| NarrativeError::Deserialize {
                context: format!("generateContent({})", self.model),
                source: e,
            })?;

        parsed
            .first_text()
            .map(str::to_owned)
            .ok_or(NarrativeError::MissingText)
    }
}

impl NarrativeGenerator for GeminiClient {
    type Error = NarrativeError;

    async fn generate(&self, input: &NarrativeInput) -> Result<String, NarrativeError> {
        let prompt = build_prompt(input)?;
        self.generate_text(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::with_base_url("secret key", "gemini-2.5-flash", 5, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_places_model_without_key() {
        let client = test_client("https://example.test");
        let url = client.build_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = test_client("https://example.test/");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("gemini-2.5-flash"));
    }

    #[test]
    fn with_retry_overrides_policy() {
        let client = test_client("https://example.test").with_retry(0, 5);
        assert_eq!(client.max_retries, 0);
        assert_eq!(client.backoff_base_ms, 5);
    }
}
