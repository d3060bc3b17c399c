//! Postgres-backed [`SessionReader`].

use std::collections::HashMap;

use livepulse_analytics::SessionReader;
use livepulse_core::{MetricSample, Session, SessionScope};
use sqlx::PgPool;

use crate::metrics::list_live_metrics;
use crate::sessions::list_live_sessions;
use crate::DbError;

/// Loads sessions oldest first, each with its samples in capture order.
#[derive(Debug, Clone)]
pub struct PgSessionReader {
    pool: PgPool,
}

impl PgSessionReader {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionReader for PgSessionReader {
    type Error = DbError;

    async fn list_sessions(&self, scope: &SessionScope) -> Result<Vec<Session>, DbError> {
        let rows = list_live_sessions(&self.pool, scope).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|r| r.session_id.clone()).collect();
        let mut samples: HashMap<String, Vec<MetricSample>> = HashMap::new();
        for metric in list_live_metrics(&self.pool, &ids).await? {
            samples
                .entry(metric.session_id.clone())
                .or_default()
                .push(metric.to_sample());
        }

        Ok(rows
            .into_iter()
            .map(|row| Session {
                samples: samples.remove(&row.session_id).unwrap_or_default(),
                session_id: row.session_id,
                username: row.username,
                started_at: row.started_at,
                ended_at: row.ended_at,
                peak_viewers: row.peak_viewers.unwrap_or(0),
            })
            .collect())
    }
}
