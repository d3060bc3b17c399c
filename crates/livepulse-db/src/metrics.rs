//! Database operations for the `live_metrics` table.

use chrono::{DateTime, Utc};
use livepulse_core::MetricSample;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `live_metrics` table.
///
/// Metric columns are nullable because the producer may omit any of them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiveMetricRow {
    pub id: i64,
    pub session_id: String,
    pub captured_at: DateTime<Utc>,
    pub viewers: Option<i64>,
    pub peak_viewers: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub algorithm_score: Option<f64>,
    pub engagement_velocity: Option<f64>,
    pub retention_rate: Option<f64>,
    pub total_likes: Option<i64>,
    pub total_comments: Option<i64>,
    pub total_gifts: Option<i64>,
    pub total_gift_value: Option<f64>,
    pub total_joins: Option<i64>,
    pub total_follows: Option<i64>,
}

impl LiveMetricRow {
    /// Convert to a sample, reading `NULL` metrics as `0`.
    #[must_use]
    pub fn to_sample(&self) -> MetricSample {
        MetricSample {
            timestamp: self.captured_at,
            algorithm_score: self.algorithm_score.unwrap_or(0.0),
            engagement_rate: self.engagement_rate.unwrap_or(0.0),
            retention_rate: self.retention_rate.unwrap_or(0.0),
            engagement_velocity: self.engagement_velocity.unwrap_or(0.0),
            viewers: self.viewers.unwrap_or(0),
            peak_viewers: self.peak_viewers.unwrap_or(0),
            total_likes: self.total_likes.unwrap_or(0),
            total_comments: self.total_comments.unwrap_or(0),
            total_gifts: self.total_gifts.unwrap_or(0),
            total_gift_value: self.total_gift_value.unwrap_or(0.0),
            total_joins: self.total_joins.unwrap_or(0),
            total_follows: self.total_follows.unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts one metric snapshot for `session_id`, captured at `sample.timestamp`.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the session
/// does not exist.
pub async fn insert_live_metric<'e>(
    executor: impl PgExecutor<'e>,
    session_id: &str,
    sample: &MetricSample,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO live_metrics \
             (session_id, captured_at, viewers, peak_viewers, engagement_rate, \
              algorithm_score, engagement_velocity, retention_rate, total_likes, \
              total_comments, total_gifts, total_gift_value, total_joins, total_follows) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING id",
    )
    .bind(session_id)
    .bind(sample.timestamp)
    .bind(sample.viewers)
    .bind(sample.peak_viewers)
    .bind(sample.engagement_rate)
    .bind(sample.algorithm_score)
    .bind(sample.engagement_velocity)
    .bind(sample.retention_rate)
    .bind(sample.total_likes)
    .bind(sample.total_comments)
    .bind(sample.total_gifts)
    .bind(sample.total_gift_value)
    .bind(sample.total_joins)
    .bind(sample.total_follows)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Lists metric rows for the given sessions, ordered by `captured_at, id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_live_metrics(
    pool: &PgPool,
    session_ids: &[String],
) -> Result<Vec<LiveMetricRow>, DbError> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, LiveMetricRow>(
        "SELECT id, session_id, captured_at, viewers, peak_viewers, engagement_rate, \
                algorithm_score, engagement_velocity, retention_rate, total_likes, \
                total_comments, total_gifts, total_gift_value, total_joins, total_follows \
         FROM live_metrics \
         WHERE session_id = ANY($1) \
         ORDER BY captured_at ASC, id ASC",
    )
    .bind(session_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
