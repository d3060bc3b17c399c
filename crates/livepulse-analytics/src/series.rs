//! Per-session chart data for the account detail view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::digest::SessionDigest;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSeries {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub scores: Vec<f64>,
    pub engagement_rates: Vec<f64>,
    pub retention_rates: Vec<f64>,
    pub last_score: f64,
    pub peak_viewers: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_gifts: i64,
}

impl From<&SessionDigest> for SessionSeries {
    fn from(digest: &SessionDigest) -> Self {
        Self {
            session_id: digest.session_id.clone(),
            started_at: digest.started_at,
            ended_at: digest.ended_at,
            scores: digest.scores.clone(),
            engagement_rates: digest.engagement_rates.clone(),
            retention_rates: digest.retention_rates.clone(),
            last_score: digest.last_score,
            peak_viewers: digest.peak_viewers,
            total_likes: digest.total_likes,
            total_comments: digest.total_comments,
            total_gifts: digest.total_gifts,
        }
    }
}

/// Every session of one account, in reader order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSeries {
    pub username: String,
    pub sessions: Vec<SessionSeries>,
}

impl AccountSeries {
    #[must_use]
    pub fn from_digests(username: &str, digests: &[SessionDigest]) -> Self {
        Self {
            username: username.to_string(),
            sessions: digests.iter().map(SessionSeries::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use livepulse_core::{MetricSample, Session};

    use super::*;
    use crate::digest::summarize_session;

    #[test]
    fn series_carries_digest_arrays_and_totals() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
        let session = Session {
            session_id: "s-1".into(),
            username: "rina".into(),
            started_at: t0,
            ended_at: Some(t0 + chrono::Duration::hours(1)),
            peak_viewers: 0,
            samples: vec![
                MetricSample {
                    timestamp: t0 + chrono::Duration::seconds(10),
                    algorithm_score: 42.0,
                    engagement_rate: 1.5,
                    retention_rate: 0.7,
                    peak_viewers: 120,
                    total_likes: 900,
                    total_comments: 40,
                    total_gifts: 3,
                    ..MetricSample::default()
                },
                MetricSample {
                    timestamp: t0,
                    algorithm_score: 12.0,
                    ..MetricSample::default()
                },
            ],
        };

        let series = AccountSeries::from_digests("rina", &[summarize_session(&session)]);
        assert_eq!(series.username, "rina");
        let s = &series.sessions[0];
        assert_eq!(s.scores, vec![12.0, 42.0]);
        assert_eq!(s.last_score, 42.0);
        assert_eq!(s.peak_viewers, 120);
        assert_eq!(s.total_likes, 900);
        assert_eq!(s.total_comments, 40);
        assert_eq!(s.total_gifts, 3);
        assert_eq!(s.ended_at, session.ended_at);
    }
}
