//! Proxy routes for the live-monitor service and snapshot ingestion.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use livepulse_core::{ActiveMonitorsResponse, LiveMetricsSnapshot, StartMonitoringResponse};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_monitor_error, validated_username, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `start`/`stop`. The field is optional so a missing username is
/// reported as `validation_error` instead of a JSON rejection.
#[derive(Debug, Deserialize)]
pub(super) struct UsernameRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LiveMetricsQuery {
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct StopMonitoringData {
    success: bool,
    message: String,
    username: String,
    /// Open sessions marked ended for this account.
    sessions_closed: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct RecordedSnapshotData {
    session_id: String,
    username: String,
    metric_id: i64,
    peak_viewers: Option<i64>,
    captured_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/live/start — ask the monitor to start tracking an account.
pub(super) async fn start_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UsernameRequest>,
) -> Result<Json<ApiResponse<StartMonitoringResponse>>, ApiError> {
    let username = validated_username(&req_id.0, body.username.as_deref().unwrap_or_default())?;

    let started = state
        .monitor
        .start_monitoring(&username)
        .await
        .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    tracing::info!(username = %username, session_id = %started.session_id, "monitoring started");

    Ok(Json(ApiResponse {
        data: started,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/live/stop — stop tracking and close the account's open sessions.
pub(super) async fn stop_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UsernameRequest>,
) -> Result<Json<ApiResponse<StopMonitoringData>>, ApiError> {
    let username = validated_username(&req_id.0, body.username.as_deref().unwrap_or_default())?;

    let stopped = state
        .monitor
        .stop_monitoring(&username)
        .await
        .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    // Sessions stay open when the monitor refused to stop.
    let sessions_closed = if stopped.success {
        livepulse_db::end_live_sessions_for_user(&state.pool, &username)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    } else {
        0
    };

    tracing::info!(username = %username, sessions_closed, "monitoring stopped");

    Ok(Json(ApiResponse {
        data: StopMonitoringData {
            success: stopped.success,
            message: stopped.message,
            username,
            sessions_closed,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/live/metrics?username= — current snapshot from the monitor.
pub(super) async fn get_live_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LiveMetricsQuery>,
) -> Result<Json<ApiResponse<LiveMetricsSnapshot>>, ApiError> {
    let username = validated_username(&req_id.0, query.username.as_deref().unwrap_or_default())?;

    let snapshot = state
        .monitor
        .live_metrics(&username)
        .await
        .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: snapshot,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/live/active — accounts the monitor is tracking.
pub(super) async fn list_active_monitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ActiveMonitorsResponse>>, ApiError> {
    let active = state
        .monitor
        .active_monitors()
        .await
        .map_err(|e| map_monitor_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: active,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/live/snapshots — persist one pushed snapshot.
pub(super) async fn record_snapshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(snapshot): Json<LiveMetricsSnapshot>,
) -> Result<(StatusCode, Json<ApiResponse<RecordedSnapshotData>>), ApiError> {
    let captured_at = Utc::now();
    let recorded = livepulse_db::record_live_snapshot(&state.pool, &snapshot, captured_at)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: RecordedSnapshotData {
                session_id: recorded.session.session_id,
                username: recorded.session.username,
                metric_id: recorded.metric_id,
                peak_viewers: recorded.session.peak_viewers,
                captured_at,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
