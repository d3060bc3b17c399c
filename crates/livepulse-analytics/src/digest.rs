//! Per-session reduction of metric samples.

use chrono::{DateTime, Utc};
use livepulse_core::{MetricSample, Session};
use serde::Serialize;

/// Fixed-shape summary of one session, the unit of input to aggregation.
///
/// Arrays are in timestamp order. Totals come from the chronologically last
/// sample because the producer reports cumulative counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDigest {
    pub username: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub scores: Vec<f64>,
    pub engagement_rates: Vec<f64>,
    pub retention_rates: Vec<f64>,
    pub engagement_velocities: Vec<f64>,
    pub last_score: f64,
    pub peak_viewers: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_gifts: i64,
    pub total_gift_value: f64,
    pub total_joins: i64,
    pub total_follows: i64,
}

impl SessionDigest {
    /// Highest score recorded in this session, `0.0` if it has none.
    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.scores.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }
}

/// Reduce one session to its digest.
///
/// Samples are stable-sorted by timestamp first, so the result does not depend
/// on storage order. A session without samples yields empty arrays, a zero
/// `last_score`, zero totals and the session-level `peak_viewers`.
#[must_use]
pub fn summarize_session(session: &Session) -> SessionDigest {
    let mut samples: Vec<&MetricSample> = session.samples.iter().collect();
    samples.sort_by_key(|s| s.timestamp);

    let collect = |f: fn(&MetricSample) -> f64| -> Vec<f64> {
        samples.iter().map(|s| f(s)).collect()
    };

    let scores = collect(|s| s.algorithm_score);
    let engagement_rates = collect(|s| s.engagement_rate);
    let retention_rates = collect(|s| s.retention_rate);
    let engagement_velocities = collect(|s| s.engagement_velocity);
    let last_score = scores.last().copied().unwrap_or(0.0);

    let last = samples.last();

    SessionDigest {
        username: session.username.clone(),
        session_id: session.session_id.clone(),
        started_at: session.started_at,
        ended_at: session.ended_at,
        scores,
        engagement_rates,
        retention_rates,
        engagement_velocities,
        last_score,
        peak_viewers: last.map_or(session.peak_viewers, |s| s.peak_viewers),
        total_likes: last.map_or(0, |s| s.total_likes),
        total_comments: last.map_or(0, |s| s.total_comments),
        total_gifts: last.map_or(0, |s| s.total_gifts),
        total_gift_value: last.map_or(0.0, |s| s.total_gift_value),
        total_joins: last.map_or(0, |s| s.total_joins),
        total_follows: last.map_or(0, |s| s.total_follows),
    }
}
