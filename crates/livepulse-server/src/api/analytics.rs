//! Read-only analytics over recorded sessions.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use livepulse_analytics::{
    sort_accounts, AccountSeries, AccountSort, AnalyticsSummary, NarrativeFailure, SortOrder,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_analytics_error, validated_username, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Query and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SummaryQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct NarrativeData {
    username: String,
    analysis: Option<String>,
    sessions_analyzed: usize,
    /// Set when `analysis` is `null`, e.g. `no_sessions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    model: String,
}

fn parse_sort(
    req_id: &str,
    query: &SummaryQuery,
) -> Result<Option<(AccountSort, SortOrder)>, ApiError> {
    let Some(sort) = query.sort.as_deref() else {
        return Ok(None);
    };
    let sort = AccountSort::from_str(sort)
        .map_err(|e| ApiError::new(req_id, "validation_error", e))?;
    let order = match query.order.as_deref() {
        Some(order) => SortOrder::from_str(order)
            .map_err(|e| ApiError::new(req_id, "validation_error", e))?,
        None => SortOrder::default(),
    };
    Ok(Some((sort, order)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/analytics/summary — global summary plus one row per account.
pub(super) async fn get_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>, ApiError> {
    let sort = parse_sort(&req_id.0, &query)?;

    let mut summary = state
        .analytics
        .summary()
        .await
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e))?;

    if let Some((field, order)) = sort {
        sort_accounts(&mut summary.accounts, field, order);
    }

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/analytics/accounts/{username} — per-session chart series.
pub(super) async fn get_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<AccountSeries>>, ApiError> {
    let username = validated_username(&req_id.0, &username)?;

    let series = state
        .analytics
        .account_series(&username)
        .await
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: series,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/analytics/accounts/{username}/narrative — generated report.
pub(super) async fn get_narrative(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<NarrativeData>>, ApiError> {
    let username = validated_username(&req_id.0, &username)?;

    let Some(narrator) = state.narrator.as_deref() else {
        return Err(ApiError::new(
            &req_id.0,
            "narrative_not_configured",
            "narrative generation is not configured",
        ));
    };

    let narrative = state
        .analytics
        .narrative(&username, narrator)
        .await
        .map_err(|failure| match failure {
            NarrativeFailure::Data(e) => map_analytics_error(req_id.0.clone(), &e),
            NarrativeFailure::Unavailable(e) if e.is_overloaded() => ApiError::new(
                &req_id.0,
                "narrative_overloaded",
                "narrative model is overloaded; try again later",
            )
            .retryable(),
            NarrativeFailure::Unavailable(e) => {
                ApiError::new(&req_id.0, "narrative_unavailable", e.to_string())
            }
        })?;

    let reason = narrative.analysis.is_none().then_some("no_sessions");

    Ok(Json(ApiResponse {
        data: NarrativeData {
            username: narrative.username,
            analysis: narrative.analysis,
            sessions_analyzed: narrative.sessions_analyzed,
            reason,
            model: narrator.model().to_string(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(sort: Option<&str>, order: Option<&str>) -> SummaryQuery {
        SummaryQuery {
            sort: sort.map(str::to_string),
            order: order.map(str::to_string),
        }
    }

    #[test]
    fn no_sort_means_reader_order() {
        assert!(parse_sort("r", &query(None, Some("asc"))).unwrap().is_none());
    }

    #[test]
    fn order_defaults_to_descending() {
        let parsed = parse_sort("r", &query(Some("avg_score"), None)).unwrap();
        assert_eq!(parsed, Some((AccountSort::AvgScore, SortOrder::Desc)));
    }

    #[test]
    fn unknown_sort_field_is_a_validation_error() {
        let err = parse_sort("r", &query(Some("followers"), None)).unwrap_err();
        assert_eq!(err.error.code, "validation_error");
    }

    #[test]
    fn unknown_order_is_a_validation_error() {
        let err = parse_sort("r", &query(Some("sessions"), Some("sideways"))).unwrap_err();
        assert_eq!(err.error.code, "validation_error");
    }
}
