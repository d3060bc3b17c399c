//! Cross-session and cross-account rollups.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::digest::SessionDigest;
use crate::factors::{Factor, FactorScores, ENGAGEMENT_RATE_RANGE, RETENTION_RANGE};
use crate::stats::{average, median, normalize_to_100};

/// Totals, score statistics and factor indicators across every account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSummary {
    pub total_accounts: usize,
    pub total_sessions: usize,
    pub avg_score_all: f64,
    pub best_score_overall: f64,
    pub median_score: f64,
    pub engagement_factor: f64,
    pub retention_factor: f64,
    /// Mirrors `engagement_factor` until a unique-participant signal exists.
    pub quality_factor: f64,
    pub monetization_factor: f64,
    pub follow_factor: f64,
    /// Factors reported as `0` because they are reserved, not measured.
    pub pending_factors: Vec<Factor>,
}

impl GlobalSummary {
    /// The summary reported when there are no sessions at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_accounts: 0,
            total_sessions: 0,
            avg_score_all: 0.0,
            best_score_overall: 0.0,
            median_score: 0.0,
            engagement_factor: 0.0,
            retention_factor: 0.0,
            quality_factor: 0.0,
            monetization_factor: 0.0,
            follow_factor: 0.0,
            pending_factors: Factor::PENDING.to_vec(),
        }
    }
}

/// One row per account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInsight {
    pub username: String,
    pub sessions_count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub avg_engagement_rate: f64,
    pub avg_retention_rate: f64,
    pub avg_engagement_velocity: f64,
    pub strength_factors: Vec<Factor>,
    pub weakness_factors: Vec<Factor>,
    pub best_session_id: String,
    pub best_session_started_at: DateTime<Utc>,
    pub best_session_peak_viewers: i64,
    pub best_session_score: f64,
    pub last_session_score: f64,
    pub last_session_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub global: GlobalSummary,
    pub accounts: Vec<AccountInsight>,
}

/// Fold every session digest into the global summary and per-account insights.
///
/// Accounts are returned in order of first appearance in `digests`. Within an
/// account, `digests` order is the processing order used for best-session
/// tie-breaks.
#[must_use]
pub fn aggregate(digests: &[SessionDigest]) -> AnalyticsSummary {
    if digests.is_empty() {
        return AnalyticsSummary {
            global: GlobalSummary::empty(),
            accounts: Vec::new(),
        };
    }

    let groups = group_by_username(digests);

    let all_scores = positive_scores(digests.iter());
    let all_engagement: Vec<f64> = digests
        .iter()
        .flat_map(|d| d.engagement_rates.iter().copied())
        .collect();
    let all_retention: Vec<f64> = digests
        .iter()
        .flat_map(|d| d.retention_rates.iter().copied())
        .collect();

    let (eng_min, eng_max) = ENGAGEMENT_RATE_RANGE;
    let (ret_min, ret_max) = RETENTION_RANGE;
    let engagement_factor = normalize_to_100(average(&all_engagement), eng_min, eng_max);
    let retention_factor = normalize_to_100(average(&all_retention), ret_min, ret_max);

    let global = GlobalSummary {
        total_accounts: groups.len(),
        total_sessions: digests.len(),
        avg_score_all: average(&all_scores),
        best_score_overall: max_or_zero(&all_scores),
        median_score: median(&all_scores),
        engagement_factor,
        retention_factor,
        quality_factor: engagement_factor,
        monetization_factor: 0.0,
        follow_factor: 0.0,
        pending_factors: Factor::PENDING.to_vec(),
    };

    let accounts = groups
        .into_iter()
        .filter_map(|(username, sessions)| account_insight(username, &sessions))
        .collect();

    AnalyticsSummary { global, accounts }
}

/// Group digests by username, preserving first-appearance order of accounts
/// and input order of sessions within each account.
fn group_by_username(digests: &[SessionDigest]) -> Vec<(&str, Vec<&SessionDigest>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&SessionDigest>)> = Vec::new();

    for digest in digests {
        let slot = *index.entry(digest.username.as_str()).or_insert_with(|| {
            groups.push((digest.username.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(digest);
    }

    groups
}

/// Scores of `0` mean "nothing recorded" and are excluded from score statistics.
fn positive_scores<'a>(digests: impl Iterator<Item = &'a SessionDigest>) -> Vec<f64> {
    digests
        .flat_map(|d| d.scores.iter().copied())
        .filter(|&v| v > 0.0)
        .collect()
}

fn max_or_zero(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn min_or_zero(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Concatenate one per-sample series across sessions, zeros included.
fn pooled<'a>(
    sessions: &[&'a SessionDigest],
    series: impl Fn(&'a SessionDigest) -> &'a [f64],
) -> Vec<f64> {
    sessions
        .iter()
        .flat_map(|&d| series(d).iter().copied())
        .collect()
}

fn account_insight(username: &str, sessions: &[&SessionDigest]) -> Option<AccountInsight> {
    let first = *sessions.first()?;

    let scores = positive_scores(sessions.iter().copied());
    let avg_score = average(&scores);
    let best_score = max_or_zero(&scores);
    let worst_score = min_or_zero(&scores);

    let avg_engagement_rate = average(&pooled(sessions, |d| d.engagement_rates.as_slice()));
    let avg_retention_rate = average(&pooled(sessions, |d| d.retention_rates.as_slice()));
    let avg_engagement_velocity =
        average(&pooled(sessions, |d| d.engagement_velocities.as_slice()));

    let factors = FactorScores::from_averages(
        avg_engagement_velocity,
        avg_retention_rate,
        avg_engagement_rate,
    );

    // Later sessions win ties: `>=` lets an equal maximum replace the current best.
    let mut best_session = first;
    let mut best_session_score = best_score;
    for &session in sessions {
        let session_max = session.max_score();
        if session_max >= best_session_score {
            best_session_score = session_max;
            best_session = session;
        }
    }

    // Most recent start wins; equal start times keep the earlier-processed session.
    let last_session = sessions
        .iter()
        .copied()
        .min_by(|a, b| b.started_at.cmp(&a.started_at))
        .unwrap_or(first);

    Some(AccountInsight {
        username: username.to_string(),
        sessions_count: sessions.len(),
        avg_score,
        best_score,
        worst_score,
        avg_engagement_rate,
        avg_retention_rate,
        avg_engagement_velocity,
        strength_factors: factors.strengths(),
        weakness_factors: factors.weaknesses(),
        best_session_id: best_session.session_id.clone(),
        best_session_started_at: best_session.started_at,
        best_session_peak_viewers: best_session.peak_viewers,
        best_session_score,
        last_session_score: last_session.last_score,
        last_session_started_at: last_session.started_at,
    })
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
