use chrono::{Duration, TimeZone};
use livepulse_core::{MetricSample, Session};

use super::*;
use crate::digest::summarize_session;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap()
}

fn sample(offset_secs: i64, score: f64, engagement: f64, retention: f64) -> MetricSample {
    MetricSample {
        timestamp: t0() + Duration::seconds(offset_secs),
        algorithm_score: score,
        engagement_rate: engagement,
        retention_rate: retention,
        ..MetricSample::default()
    }
}

fn session(
    id: &str,
    username: &str,
    start_offset_hours: i64,
    samples: Vec<MetricSample>,
) -> Session {
    Session {
        session_id: id.to_string(),
        username: username.to_string(),
        started_at: t0() + Duration::hours(start_offset_hours),
        ended_at: None,
        peak_viewers: 0,
        samples,
    }
}

fn digests(sessions: &[Session]) -> Vec<SessionDigest> {
    sessions.iter().map(summarize_session).collect()
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

#[test]
fn empty_input_yields_zero_summary() {
    let summary = aggregate(&[]);
    assert!(summary.accounts.is_empty());
    let g = &summary.global;
    assert_eq!(g.total_accounts, 0);
    assert_eq!(g.total_sessions, 0);
    assert_eq!(g.avg_score_all, 0.0);
    assert_eq!(g.best_score_overall, 0.0);
    assert_eq!(g.median_score, 0.0);
    assert_eq!(g.engagement_factor, 0.0);
    assert_eq!(g.retention_factor, 0.0);
    assert_eq!(g.quality_factor, 0.0);
    assert_eq!(g.monetization_factor, 0.0);
    assert_eq!(g.follow_factor, 0.0);
    assert_eq!(g.pending_factors, vec![Factor::Monetization, Factor::Follow]);
}

#[test]
fn two_session_account_end_to_end() {
    let sessions = vec![
        session(
            "A",
            "rina",
            0,
            vec![sample(1, 10.0, 1.0, 0.5), sample(2, 20.0, 2.0, 0.5)],
        ),
        session("B", "rina", 24, vec![sample(1, 50.0, 4.0, 0.9)]),
    ];
    let summary = aggregate(&digests(&sessions));

    assert_eq!(summary.accounts.len(), 1);
    let account = &summary.accounts[0];
    assert_eq!(account.username, "rina");
    assert_eq!(account.sessions_count, 2);
    assert!(approx(account.avg_score, 80.0 / 3.0, 1e-9));
    assert_eq!(account.best_score, 50.0);
    assert_eq!(account.worst_score, 10.0);
    assert!(approx(account.avg_engagement_rate, 7.0 / 3.0, 1e-9));
    assert!(approx(account.avg_retention_rate, 1.9 / 3.0, 1e-9));
    assert_eq!(account.best_session_id, "B");
    assert_eq!(account.best_session_score, 50.0);
    assert_eq!(account.last_session_score, 50.0);
    assert_eq!(account.last_session_started_at, t0() + Duration::hours(24));

    // retention ≈ 63.3 (strength), quality ≈ 46.7 (neither), velocity = 0 (weak).
    assert_eq!(account.strength_factors, vec![Factor::Retention]);
    assert_eq!(
        account.weakness_factors,
        vec![Factor::EngagementVelocity, Factor::Monetization]
    );

    let factors = FactorScores::from_averages(
        account.avg_engagement_velocity,
        account.avg_retention_rate,
        account.avg_engagement_rate,
    );
    assert!(approx(factors.retention, 63.333, 0.01));
    assert!(approx(factors.quality, 46.667, 0.01));
}

#[test]
fn zero_scores_do_not_affect_score_statistics() {
    let sessions = vec![session(
        "A",
        "rina",
        0,
        vec![
            sample(1, 0.0, 1.0, 0.5),
            sample(2, 30.0, 1.0, 0.5),
            sample(3, 0.0, 1.0, 0.5),
            sample(4, 60.0, 1.0, 0.5),
        ],
    )];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.avg_score, 45.0);
    assert_eq!(account.best_score, 60.0);
    assert_eq!(account.worst_score, 30.0);
    assert_eq!(summary.global.median_score, 45.0);
}

#[test]
fn all_zero_scores_give_zero_statistics() {
    let sessions = vec![session(
        "A",
        "rina",
        0,
        vec![sample(1, 0.0, 1.0, 0.5), sample(2, 0.0, 1.0, 0.5)],
    )];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.avg_score, 0.0);
    assert_eq!(account.best_score, 0.0);
    assert_eq!(account.worst_score, 0.0);
    assert_eq!(summary.global.avg_score_all, 0.0);
    assert_eq!(summary.global.best_score_overall, 0.0);
    assert_eq!(summary.global.median_score, 0.0);
}

#[test]
fn zero_filled_samples_still_count_toward_rate_averages() {
    let sessions = vec![session(
        "A",
        "rina",
        0,
        vec![sample(1, 10.0, 0.0, 0.0), sample(2, 10.0, 4.0, 1.0)],
    )];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.avg_engagement_rate, 2.0);
    assert_eq!(account.avg_retention_rate, 0.5);
}

#[test]
fn equal_max_score_later_session_wins() {
    let sessions = vec![
        session("first", "rina", 0, vec![sample(1, 70.0, 1.0, 0.5)]),
        session("second", "rina", 1, vec![sample(1, 70.0, 1.0, 0.5)]),
    ];
    let summary = aggregate(&digests(&sessions));
    assert_eq!(summary.accounts[0].best_session_id, "second");
    assert_eq!(summary.accounts[0].best_session_score, 70.0);

    // Processing order decides, not start time.
    let reversed = vec![sessions[1].clone(), sessions[0].clone()];
    let summary = aggregate(&digests(&reversed));
    assert_eq!(summary.accounts[0].best_session_id, "first");
}

#[test]
fn account_without_scores_picks_last_processed_session_as_best() {
    let sessions = vec![
        session("empty-1", "rina", 0, vec![]),
        session("empty-2", "rina", 1, vec![]),
    ];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.best_session_id, "empty-2");
    assert_eq!(account.best_session_score, 0.0);
    assert_eq!(account.last_session_score, 0.0);
}

#[test]
fn last_session_is_latest_start_not_last_processed() {
    let sessions = vec![
        session("late", "rina", 48, vec![sample(1, 15.0, 1.0, 0.5)]),
        session("early", "rina", 0, vec![sample(1, 90.0, 1.0, 0.5)]),
    ];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.last_session_score, 15.0);
    assert_eq!(account.last_session_started_at, t0() + Duration::hours(48));
    assert_eq!(account.best_session_id, "early");
}

#[test]
fn last_session_tie_on_start_keeps_earlier_processed() {
    let sessions = vec![
        session("one", "rina", 5, vec![sample(1, 11.0, 1.0, 0.5)]),
        session("two", "rina", 5, vec![sample(1, 22.0, 1.0, 0.5)]),
    ];
    let summary = aggregate(&digests(&sessions));
    assert_eq!(summary.accounts[0].last_session_score, 11.0);
}

#[test]
fn last_session_without_samples_reports_zero() {
    let sessions = vec![
        session("old", "rina", 0, vec![sample(1, 40.0, 1.0, 0.5)]),
        session("new", "rina", 10, vec![]),
    ];
    let summary = aggregate(&digests(&sessions));
    let account = &summary.accounts[0];
    assert_eq!(account.last_session_score, 0.0);
    assert_eq!(account.best_score, 40.0);
}

#[test]
fn global_rollup_spans_accounts() {
    let sessions = vec![
        session("a1", "rina", 0, vec![sample(1, 10.0, 5.0, 1.0)]),
        session("b1", "budi", 0, vec![sample(1, 30.0, 0.0, 0.0)]),
        session("a2", "rina", 1, vec![sample(1, 20.0, 5.0, 1.0)]),
    ];
    let summary = aggregate(&digests(&sessions));
    let g = &summary.global;
    assert_eq!(g.total_accounts, 2);
    assert_eq!(g.total_sessions, 3);
    assert_eq!(g.avg_score_all, 20.0);
    assert_eq!(g.best_score_overall, 30.0);
    assert_eq!(g.median_score, 20.0);
    // Pooled engagement = (5 + 0 + 5) / 3 → 2/3 of the [0, 5] range.
    assert!(approx(g.engagement_factor, 200.0 / 3.0, 1e-9));
    assert_eq!(g.quality_factor, g.engagement_factor);
    assert!(approx(g.retention_factor, 200.0 / 3.0, 1e-9));
    assert_eq!(g.monetization_factor, 0.0);
    assert_eq!(g.follow_factor, 0.0);

    let names: Vec<&str> = summary.accounts.iter().map(|a| a.username.as_str()).collect();
    assert_eq!(names, vec!["rina", "budi"]);
    assert_eq!(summary.accounts[0].sessions_count, 2);
}

#[test]
fn global_factors_clamp_to_range() {
    let sessions = vec![session("a", "rina", 0, vec![sample(1, 10.0, 12.0, 3.0)])];
    let summary = aggregate(&digests(&sessions));
    assert_eq!(summary.global.engagement_factor, 100.0);
    assert_eq!(summary.global.retention_factor, 100.0);
}

#[test]
fn best_session_reports_its_peak_viewers() {
    let mut strong = session("strong", "rina", 1, vec![sample(1, 80.0, 1.0, 0.5)]);
    strong.samples[0].peak_viewers = 512;
    let weak = session("weak", "rina", 0, vec![sample(1, 20.0, 1.0, 0.5)]);
    let summary = aggregate(&digests(&[weak, strong]));
    assert_eq!(summary.accounts[0].best_session_peak_viewers, 512);
}

#[test]
fn summary_serializes_with_snake_case_fields() {
    let sessions = vec![session("a", "rina", 0, vec![sample(1, 10.0, 1.0, 0.5)])];
    let json = serde_json::to_value(aggregate(&digests(&sessions))).unwrap();
    assert!(json["global"]["avg_score_all"].is_number());
    assert_eq!(json["global"]["pending_factors"][0], "monetization");
    assert_eq!(json["accounts"][0]["best_session_id"], "a");
    assert!(json["accounts"][0]["strength_factors"].is_array());
}
