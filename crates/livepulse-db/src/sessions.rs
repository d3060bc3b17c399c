//! Database operations for the `live_sessions` table.

use chrono::{DateTime, Utc};
use livepulse_core::SessionScope;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `live_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiveSessionRow {
    pub id: i64,
    pub session_id: String,
    pub username: String,
    pub started_at: DateTime<Utc>,
    /// `NULL` while the session is open.
    pub ended_at: Option<DateTime<Utc>>,
    pub is_streaming: bool,
    /// Highest viewer peak seen in any recorded snapshot.
    pub peak_viewers: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SESSION_COLUMNS: &str = "id, session_id, username, started_at, ended_at, is_streaming, \
                               peak_viewers, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a session, or updates the username of an existing one.
///
/// `peak_viewers` only ever rises: the stored value becomes the larger of the
/// existing peak and the supplied one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_live_session<'e>(
    executor: impl PgExecutor<'e>,
    session_id: &str,
    username: &str,
    peak_viewers: Option<i64>,
) -> Result<LiveSessionRow, DbError> {
    let sql = format!(
        "INSERT INTO live_sessions (session_id, username, is_streaming, peak_viewers) \
         VALUES ($1, $2, TRUE, $3) \
         ON CONFLICT (session_id) DO UPDATE SET \
             username     = EXCLUDED.username, \
             peak_viewers = CASE \
                 WHEN live_sessions.peak_viewers IS NULL THEN EXCLUDED.peak_viewers \
                 WHEN EXCLUDED.peak_viewers IS NULL THEN live_sessions.peak_viewers \
                 ELSE GREATEST(live_sessions.peak_viewers, EXCLUDED.peak_viewers) \
             END, \
             updated_at   = NOW() \
         RETURNING {SESSION_COLUMNS}"
    );

    let row = sqlx::query_as::<_, LiveSessionRow>(&sql)
        .bind(session_id)
        .bind(username)
        .bind(peak_viewers)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// Fetches one session by its external identifier.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no session has this `session_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_live_session(pool: &PgPool, session_id: &str) -> Result<LiveSessionRow, DbError> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM live_sessions WHERE session_id = $1");

    sqlx::query_as::<_, LiveSessionRow>(&sql)
        .bind(session_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Closes every open session of `username`: sets `ended_at = NOW()` and
/// clears `is_streaming`. Already-closed sessions are untouched.
///
/// Returns the number of sessions closed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn end_live_sessions_for_user(pool: &PgPool, username: &str) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE live_sessions \
         SET ended_at = NOW(), is_streaming = FALSE, updated_at = NOW() \
         WHERE username = $1 AND ended_at IS NULL",
    )
    .bind(username)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Lists sessions in scope, oldest first (`started_at ASC, id ASC`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_live_sessions(
    pool: &PgPool,
    scope: &SessionScope,
) -> Result<Vec<LiveSessionRow>, DbError> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM live_sessions \
         WHERE ($1::TEXT IS NULL OR username = $1) \
         ORDER BY started_at ASC, id ASC"
    );

    let rows = sqlx::query_as::<_, LiveSessionRow>(&sql)
        .bind(scope.username())
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
