//! HTTP client for the live-monitor REST API.
//!
//! Every request carries the bearer token (when configured) and expects a
//! JSON body. Non-2xx responses surface as [`MonitorError::UpstreamStatus`]
//! with a truncated copy of the body.

use std::time::Duration;

use livepulse_core::{
    ActiveMonitorsResponse, LiveMetricsSnapshot, StartMonitoringResponse, StopMonitoringResponse,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{truncate_body, MonitorError};

#[derive(Debug, Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

/// Client for the live-monitor service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
}

impl MonitorClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MonitorError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, MonitorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("livepulse/0.1 (live-analytics)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| MonitorError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            base_url: parsed,
        })
    }

    /// Asks the service to start watching `username`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] on transport failure, a non-2xx status, or an
    /// unexpected body.
    pub async fn start_monitoring(
        &self,
        username: &str,
    ) -> Result<StartMonitoringResponse, MonitorError> {
        let request = self
            .request(Method::POST, "api/start-monitoring")?
            .json(&UsernameBody { username });
        Self::send_json(request, "start-monitoring").await
    }

    /// Asks the service to stop watching `username`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] on transport failure, a non-2xx status, or an
    /// unexpected body.
    pub async fn stop_monitoring(
        &self,
        username: &str,
    ) -> Result<StopMonitoringResponse, MonitorError> {
        let request = self
            .request(Method::POST, "api/stop-monitoring")?
            .json(&UsernameBody { username });
        Self::send_json(request, "stop-monitoring").await
    }

    /// Fetches the current metrics snapshot for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] on transport failure, a non-2xx status, or an
    /// unexpected body.
    pub async fn live_metrics(&self, username: &str) -> Result<LiveMetricsSnapshot, MonitorError> {
        let path = format!(
            "api/live-metrics/{}",
            utf8_percent_encode(username, NON_ALPHANUMERIC)
        );
        let request = self.request(Method::GET, &path)?;
        Self::send_json(request, &format!("live-metrics({username})")).await
    }

    /// Lists every account the service is currently watching.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] on transport failure, a non-2xx status, or an
    /// unexpected body.
    pub async fn active_monitors(&self) -> Result<ActiveMonitorsResponse, MonitorError> {
        let request = self.request(Method::GET, "api/active-monitors")?;
        Self::send_json(request, "active-monitors").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, MonitorError> {
        self.base_url
            .join(path)
            .map_err(|e| MonitorError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, MonitorError> {
        let url = self.endpoint(path)?;
        let builder = self.client.request(method, url);
        Ok(match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        })
    }

    /// Sends the request, maps non-2xx statuses, and decodes the JSON body.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, MonitorError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), context, "monitor service error");
            return Err(MonitorError::UpstreamStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| MonitorError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> MonitorClient {
        MonitorClient::new(base_url, Some("k"), 5).expect("client construction should not fail")
    }

    #[test]
    fn endpoint_joins_under_base_path() {
        let client = test_client("http://monitor.local/proxy/");
        let url = client.endpoint("api/active-monitors").unwrap();
        assert_eq!(url.as_str(), "http://monitor.local/proxy/api/active-monitors");
    }

    #[test]
    fn endpoint_strips_duplicate_trailing_slashes() {
        let client = test_client("http://monitor.local//");
        let url = client.endpoint("api/start-monitoring").unwrap();
        assert_eq!(url.as_str(), "http://monitor.local/api/start-monitoring");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = MonitorClient::new("not a url", None, 5).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidBaseUrl { .. }));
    }
}
