//! Aggregation and scoring engine for live-session engagement metrics.
//!
//! Raw sessions flow through three stages: a [`SessionReader`] loads them,
//! [`summarize_session`] reduces each one to a [`SessionDigest`], and
//! [`aggregate`] folds all digests into a [`GlobalSummary`] plus one
//! [`AccountInsight`] per account. Only the read can fail; everything after
//! it is total.

pub mod aggregate;
pub mod digest;
pub mod engine;
pub mod error;
pub mod factors;
pub mod narrative;
pub mod reader;
pub mod series;
pub mod sort;
pub mod stats;

pub use aggregate::{aggregate, AccountInsight, AnalyticsSummary, GlobalSummary};
pub use digest::{summarize_session, SessionDigest};
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, NarrativeFailure};
pub use factors::{Factor, FactorScores};
pub use narrative::{Narrative, NarrativeGenerator, NarrativeInput, NarrativeSessionSummary};
pub use reader::{SessionReader, StaticSessionReader};
pub use series::{AccountSeries, SessionSeries};
pub use sort::{sort_accounts, AccountSort, SortOrder};
pub use stats::{average, median, normalize_to_100};
