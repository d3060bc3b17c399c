//! Persisting one live-monitor snapshot.

use chrono::{DateTime, Utc};
use livepulse_core::{normalize_username, LiveMetricsSnapshot};
use sqlx::PgPool;

use crate::metrics::insert_live_metric;
use crate::sessions::{upsert_live_session, LiveSessionRow};
use crate::DbError;

#[derive(Debug, Clone)]
pub struct RecordedSnapshot {
    pub session: LiveSessionRow,
    pub metric_id: i64,
}

/// Upserts the snapshot's session and appends its metrics, in one transaction.
///
/// The username is normalized (leading `@` stripped, lowercased) before it is
/// stored. The session's `peak_viewers` is raised to the snapshot's peak when
/// that is higher.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] if the username or session id is
/// missing or invalid, or [`DbError::Sqlx`] if any statement fails. Nothing
/// is written in either case.
pub async fn record_live_snapshot(
    pool: &PgPool,
    snapshot: &LiveMetricsSnapshot,
    captured_at: DateTime<Utc>,
) -> Result<RecordedSnapshot, DbError> {
    let username =
        normalize_username(&snapshot.username).map_err(|e| DbError::InvalidInput(e.to_string()))?;
    let session_id = snapshot.session_id.trim();
    if session_id.is_empty() {
        return Err(DbError::InvalidInput("session_id is required".to_string()));
    }

    let sample = snapshot.to_metric_sample(captured_at);

    let mut tx = pool.begin().await?;
    let session =
        upsert_live_session(&mut *tx, session_id, &username, Some(sample.peak_viewers)).await?;
    let metric_id = insert_live_metric(&mut *tx, session_id, &sample).await?;
    tx.commit().await?;

    tracing::debug!(
        username = %username,
        session_id,
        metric_id,
        score = sample.algorithm_score,
        "live snapshot recorded"
    );

    Ok(RecordedSnapshot { session, metric_id })
}
