//! Request tagging, bearer auth and the shared request budget.
//!
//! Rejections are rendered through [`ApiError`] so they carry the same
//! `{error, meta}` envelope as handler errors.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderName, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use livepulse_core::{AppConfig, Environment};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
/// Caller-supplied request IDs longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID stored as a request extension by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a caller-supplied ID when it is short and printable, otherwise
    /// mints a UUID v4.
    fn from_header(value: Option<&HeaderValue>) -> Self {
        let supplied = value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN);
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }
}

/// Tags the request with a [`RequestId`] and echoes it as `x-request-id`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(req.headers().get(&X_REQUEST_ID));
    let echoed = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Some(value) = echoed {
        res.headers_mut().insert(X_REQUEST_ID, value);
    }
    res
}

fn rejection(req: &Request, code: &str, message: &str) -> ApiError {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    ApiError::new(request_id, code, message)
}

/// Accepted bearer tokens. No tokens means auth is off.
#[derive(Clone, Default)]
pub struct AuthState {
    api_keys: Arc<[String]>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("api_keys", &self.api_keys.len())
            .finish()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: api_keys.into(),
        }
    }

    /// Builds auth from the configured keys.
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.api_keys.is_empty() {
            if config.env != Environment::Development {
                anyhow::bail!(
                    "LIVEPULSE_API_KEYS is required in {} environment",
                    config.env
                );
            }
            tracing::warn!("LIVEPULSE_API_KEYS not set; bearer auth disabled in development");
        }
        Ok(Self::new(config.api_keys.clone()))
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Checks every key so the time taken does not reveal which one matched.
    fn allows(&self, token: &str) -> bool {
        self.api_keys.iter().fold(false, |found, key| {
            found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
        })
    }
}

/// Rejects protected requests without a configured bearer token.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    if token.is_some_and(|t| auth.allows(t)) {
        return next.run(req).await;
    }

    rejection(&req, "unauthorized", "missing or invalid bearer token").into_response()
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

/// Request count for the window that opened at `opened_at`.
#[derive(Debug)]
struct WindowCounter {
    opened_at: Instant,
    used: u32,
}

impl WindowCounter {
    fn admit(&mut self, now: Instant, budget: u32, window: Duration) -> Admission {
        if now.saturating_duration_since(self.opened_at) >= window {
            self.opened_at = now;
            self.used = 0;
        }
        if self.used >= budget {
            let elapsed = now.saturating_duration_since(self.opened_at);
            return Admission::Limited {
                retry_after: window.saturating_sub(elapsed),
            };
        }
        self.used += 1;
        Admission::Allowed
    }
}

/// One fixed window shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    budget: u32,
    window: Duration,
    counter: Arc<Mutex<WindowCounter>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(budget: u32, window: Duration) -> Self {
        Self {
            budget,
            window,
            counter: Arc::new(Mutex::new(WindowCounter {
                opened_at: Instant::now(),
                used: 0,
            })),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    async fn admit(&self) -> Admission {
        self.counter
            .lock()
            .await
            .admit(Instant::now(), self.budget, self.window)
    }
}

/// Answers `429 rate_limited` with `Retry-After` once the window's budget is spent.
pub async fn enforce_rate_limit(
    State(limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match limit.admit().await {
        Admission::Allowed => next.run(req).await,
        Admission::Limited { retry_after } => {
            tracing::debug!(retry_after_secs = retry_after.as_secs(), "request budget spent");
            let mut res = rejection(&req, "rate_limited", "rate limit exceeded")
                .retryable()
                .into_response();
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(retry_after)));
            res
        }
    }
}

/// Whole seconds, rounded up, never below one.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
