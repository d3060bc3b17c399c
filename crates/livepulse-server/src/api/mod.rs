mod analytics;
mod live;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use livepulse_analytics::{AnalyticsEngine, AnalyticsError};
use livepulse_db::{DbError, PgSessionReader};
use livepulse_gemini::GeminiClient;
use livepulse_monitor::{MonitorClient, MonitorError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub analytics: Arc<AnalyticsEngine<PgSessionReader>>,
    pub monitor: MonitorClient,
    /// `None` when no Gemini key is configured; narrative requests then fail
    /// with `narrative_not_configured`.
    pub narrator: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        monitor: MonitorClient,
        narrator: Option<GeminiClient>,
        read_timeout: Duration,
    ) -> Self {
        let engine = AnalyticsEngine::new(PgSessionReader::new(pool.clone()))
            .with_read_timeout(read_timeout);
        Self {
            pool,
            analytics: Arc::new(engine),
            monitor,
            narrator: narrator.map(Arc::new),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                retryable: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// Marks the error as worth retrying later.
    #[must_use]
    pub fn retryable(mut self) -> Self {
        self.error.retryable = Some(true);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "data_unavailable" | "narrative_overloaded" | "narrative_not_configured" => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            "monitor_unavailable" | "narrative_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_analytics_error(request_id: String, error: &AnalyticsError) -> ApiError {
    tracing::error!(error = %error, "analytics read failed");
    ApiError::new(request_id, "data_unavailable", error.to_string())
}

pub(super) fn map_monitor_error(request_id: String, error: &MonitorError) -> ApiError {
    tracing::warn!(error = %error, "live monitor request failed");
    ApiError::new(request_id, "monitor_unavailable", error.to_string())
}

/// Normalizes a username from a path, query or body, or fails with
/// `validation_error`.
pub(super) fn validated_username(request_id: &str, raw: &str) -> Result<String, ApiError> {
    livepulse_core::normalize_username(raw)
        .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analytics/summary", get(analytics::get_summary))
        .route(
            "/api/v1/analytics/accounts/{username}",
            get(analytics::get_account),
        )
        .route(
            "/api/v1/analytics/accounts/{username}/narrative",
            get(analytics::get_narrative),
        )
        .route("/api/v1/live/start", post(live::start_monitoring))
        .route("/api/v1/live/stop", post(live::stop_monitoring))
        .route("/api/v1/live/metrics", get(live::get_live_metrics))
        .route("/api/v1/live/active", get(live::list_active_monitors))
        .route("/api/v1/live/snapshots", post(live::record_snapshot))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match livepulse_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
