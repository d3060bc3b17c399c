//! Input and output of the natural-language account report.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::digest::SessionDigest;
use crate::stats::average;

/// What the generator sees about one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeSessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub last_score: f64,
    pub avg_engagement: f64,
    pub avg_retention: f64,
}

impl From<&SessionDigest> for NarrativeSessionSummary {
    fn from(digest: &SessionDigest) -> Self {
        Self {
            session_id: digest.session_id.clone(),
            started_at: digest.started_at,
            last_score: digest.last_score,
            avg_engagement: average(&digest.engagement_rates),
            avg_retention: average(&digest.retention_rates),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeInput {
    pub username: String,
    pub sessions: Vec<NarrativeSessionSummary>,
}

impl NarrativeInput {
    #[must_use]
    pub fn from_digests(username: &str, digests: &[SessionDigest]) -> Self {
        Self {
            username: username.to_string(),
            sessions: digests.iter().map(NarrativeSessionSummary::from).collect(),
        }
    }

    /// The per-session summary array embedded in the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn sessions_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.sessions)
    }
}

/// Opaque text generation from an account summary.
///
/// Failures must surface as errors; implementations never substitute
/// placeholder text.
pub trait NarrativeGenerator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn generate(
        &self,
        input: &NarrativeInput,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub username: String,
    /// `None` when the account has no sessions and the generator was not called.
    pub analysis: Option<String>,
    pub sessions_analyzed: usize,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use livepulse_core::{MetricSample, Session};

    use super::*;
    use crate::digest::summarize_session;

    #[test]
    fn summary_averages_each_session_independently() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
        let sample = |secs: i64, score: f64, eng: f64, ret: f64| MetricSample {
            timestamp: t0 + chrono::Duration::seconds(secs),
            algorithm_score: score,
            engagement_rate: eng,
            retention_rate: ret,
            ..MetricSample::default()
        };
        let session = Session {
            session_id: "s-1".into(),
            username: "rina".into(),
            started_at: t0,
            ended_at: None,
            peak_viewers: 0,
            samples: vec![sample(1, 10.0, 1.0, 0.4), sample(2, 30.0, 3.0, 0.6)],
        };

        let input = NarrativeInput::from_digests("rina", &[summarize_session(&session)]);
        assert_eq!(input.sessions.len(), 1);
        let s = &input.sessions[0];
        assert_eq!(s.last_score, 30.0);
        assert!((s.avg_engagement - 2.0).abs() < 1e-9);
        assert!((s.avg_retention - 0.5).abs() < 1e-9);

        let json: serde_json::Value =
            serde_json::from_str(&input.sessions_json().unwrap()).unwrap();
        assert_eq!(json[0]["session_id"], "s-1");
        assert!(json[0]["avg_engagement"].is_number());
    }

    #[test]
    fn session_without_samples_summarizes_to_zero() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
        let session = Session {
            session_id: "s-2".into(),
            username: "rina".into(),
            started_at: t0,
            ended_at: None,
            peak_viewers: 5,
            samples: Vec::new(),
        };
        let summary = NarrativeSessionSummary::from(&summarize_session(&session));
        assert_eq!(summary.last_score, 0.0);
        assert_eq!(summary.avg_engagement, 0.0);
        assert_eq!(summary.avg_retention, 0.0);
    }
}
