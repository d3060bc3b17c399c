//! Normalized 0–100 performance factors and strength/weakness classification.
//!
//! Reference ranges are fixed interpretability anchors, not fitted to data.

use serde::Serialize;

use crate::stats::normalize_to_100;

/// Engagement rate is measured in interactions per viewer; 5 is treated as excellent.
pub const ENGAGEMENT_RATE_RANGE: (f64, f64) = (0.0, 5.0);
/// Retention is the fraction of viewers retained.
pub const RETENTION_RANGE: (f64, f64) = (0.0, 1.0);
pub const ENGAGEMENT_VELOCITY_RANGE: (f64, f64) = (0.0, 1.0);

/// A factor at or above this value is a strength.
pub const STRENGTH_THRESHOLD: f64 = 60.0;
/// A factor strictly below this value is a weakness.
pub const WEAKNESS_THRESHOLD: f64 = 40.0;
/// At most this many strengths and this many weaknesses are reported.
pub const MAX_LISTED_FACTORS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    EngagementVelocity,
    Retention,
    Quality,
    Monetization,
    Follow,
}

impl Factor {
    /// Factors with a reserved slot in the output that are not derived from data yet.
    pub const PENDING: [Factor; 2] = [Factor::Monetization, Factor::Follow];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Factor::EngagementVelocity => "engagement_velocity",
            Factor::Retention => "retention",
            Factor::Quality => "quality",
            Factor::Monetization => "monetization",
            Factor::Follow => "follow",
        }
    }

    /// `false` for factors that are always reported as `0` because no signal feeds them.
    #[must_use]
    pub const fn is_computed(self) -> bool {
        !matches!(self, Factor::Monetization | Factor::Follow)
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five per-account factor values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScores {
    pub engagement_velocity: f64,
    pub retention: f64,
    pub quality: f64,
    pub monetization: f64,
    pub follow: f64,
}

impl FactorScores {
    /// Normalize an account's pooled averages onto the fixed reference ranges.
    #[must_use]
    pub fn from_averages(
        avg_engagement_velocity: f64,
        avg_retention_rate: f64,
        avg_engagement_rate: f64,
    ) -> Self {
        let (vel_min, vel_max) = ENGAGEMENT_VELOCITY_RANGE;
        let (ret_min, ret_max) = RETENTION_RANGE;
        let (eng_min, eng_max) = ENGAGEMENT_RATE_RANGE;
        Self {
            engagement_velocity: normalize_to_100(avg_engagement_velocity, vel_min, vel_max),
            retention: normalize_to_100(avg_retention_rate, ret_min, ret_max),
            quality: normalize_to_100(avg_engagement_rate, eng_min, eng_max),
            monetization: 0.0,
            follow: 0.0,
        }
    }

    /// Factors ordered by value, highest first.
    ///
    /// The sort is stable: equal values keep the declaration order
    /// engagement velocity, retention, quality, monetization, follow.
    #[must_use]
    pub fn ranked(&self) -> Vec<(Factor, f64)> {
        let mut ranked = vec![
            (Factor::EngagementVelocity, self.engagement_velocity),
            (Factor::Retention, self.retention),
            (Factor::Quality, self.quality),
            (Factor::Monetization, self.monetization),
            (Factor::Follow, self.follow),
        ];
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Up to two factors valued at or above [`STRENGTH_THRESHOLD`], strongest first.
    #[must_use]
    pub fn strengths(&self) -> Vec<Factor> {
        self.ranked()
            .into_iter()
            .filter(|&(_, v)| v >= STRENGTH_THRESHOLD)
            .map(|(f, _)| f)
            .take(MAX_LISTED_FACTORS)
            .collect()
    }

    /// Up to two factors valued below [`WEAKNESS_THRESHOLD`].
    ///
    /// Uses the same descending order as [`Self::strengths`], so the strongest
    /// of the weak factors come first.
    #[must_use]
    pub fn weaknesses(&self) -> Vec<Factor> {
        self.ranked()
            .into_iter()
            .filter(|&(_, v)| v < WEAKNESS_THRESHOLD)
            .map(|(f, _)| f)
            .take(MAX_LISTED_FACTORS)
            .collect()
    }
}
