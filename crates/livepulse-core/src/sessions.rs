//! Monitored sessions and the metric samples recorded during them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One snapshot taken during a live session.
///
/// Every numeric field is required here. Loaders substitute `0` for values the
/// producer or the store did not supply, so downstream code never has to
/// reason about absent numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub algorithm_score: f64,
    pub engagement_rate: f64,
    /// Nominally in `[0, 1]`; not enforced.
    pub retention_rate: f64,
    pub engagement_velocity: f64,
    pub viewers: i64,
    pub peak_viewers: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_gifts: i64,
    pub total_gift_value: f64,
    pub total_joins: i64,
    pub total_follows: i64,
}

/// One monitored live-streaming occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub username: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is open or when the end was never observed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Session-level fallback used when no sample carries a peak.
    pub peak_viewers: i64,
    /// Samples in storage order. Consumers sort by timestamp before use.
    pub samples: Vec<MetricSample>,
}

/// Which sessions a read should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionScope {
    All,
    Account(String),
}

impl SessionScope {
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            SessionScope::All => None,
            SessionScope::Account(name) => Some(name),
        }
    }
}

impl std::fmt::Display for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionScope::All => write!(f, "all"),
            SessionScope::Account(name) => write!(f, "@{name}"),
        }
    }
}
