//! Wire payloads exchanged with the external live-monitor service.
//!
//! The monitor reports numbers loosely: fields may be missing or `null`
//! depending on how far into a stream it is. Every numeric field therefore
//! decodes with a zero default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::sessions::MetricSample;

/// Deserialize a possibly-`null` value, substituting the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveCurrentMetrics {
    #[serde(deserialize_with = "null_as_default")]
    pub viewers: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub peak_viewers: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub engagement_rate: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub algorithm_score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub engagement_velocity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub retention_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRawMetrics {
    #[serde(deserialize_with = "null_as_default")]
    pub viewer_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub peak_viewers: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_likes: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_like_events: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_comments: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_gifts: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_gift_value: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_joins: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_follows: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_commenters: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_gifters: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_viewers: i64,
}

/// One polling tick as reported by the monitor for a single account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveMetricsSnapshot {
    pub username: String,
    pub session_id: String,
    pub is_streaming: bool,
    pub current_metrics: LiveCurrentMetrics,
    pub raw_metrics: LiveRawMetrics,
}

impl LiveMetricsSnapshot {
    /// Flatten the snapshot into the sample shape stored per session.
    #[must_use]
    pub fn to_metric_sample(&self, timestamp: DateTime<Utc>) -> MetricSample {
        let current = &self.current_metrics;
        let raw = &self.raw_metrics;
        MetricSample {
            timestamp,
            algorithm_score: current.algorithm_score,
            engagement_rate: current.engagement_rate,
            retention_rate: current.retention_rate,
            engagement_velocity: current.engagement_velocity,
            viewers: current.viewers,
            peak_viewers: current.peak_viewers,
            total_likes: raw.total_likes,
            total_comments: raw.total_comments,
            total_gifts: raw.total_gifts,
            total_gift_value: raw.total_gift_value,
            total_joins: raw.total_joins,
            total_follows: raw.total_follows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartMonitoringResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopMonitoringResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveMonitor {
    pub username: String,
    pub session_id: String,
    pub is_streaming: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub current_viewers: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub algorithm_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveMonitorsResponse {
    pub count: usize,
    pub monitors: Vec<ActiveMonitor>,
}
