//! Caller-selected ordering of account rows.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::aggregate::AccountInsight;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSort {
    Username,
    Sessions,
    AvgScore,
    BestScore,
    WorstScore,
    LastSession,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    /// Highest values first; the default for every field.
    #[default]
    Desc,
}

impl FromStr for AccountSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "username" => Ok(Self::Username),
            "sessions" => Ok(Self::Sessions),
            "avg_score" => Ok(Self::AvgScore),
            "best_score" => Ok(Self::BestScore),
            "worst_score" => Ok(Self::WorstScore),
            "last_session" => Ok(Self::LastSession),
            other => Err(format!(
                "unknown sort field '{other}' (expected username, sessions, avg_score, \
                 best_score, worst_score or last_session)"
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

fn compare(a: &AccountInsight, b: &AccountInsight, field: AccountSort) -> Ordering {
    match field {
        AccountSort::Username => a.username.cmp(&b.username),
        AccountSort::Sessions => a.sessions_count.cmp(&b.sessions_count),
        AccountSort::AvgScore => a.avg_score.total_cmp(&b.avg_score),
        AccountSort::BestScore => a.best_score.total_cmp(&b.best_score),
        AccountSort::WorstScore => a.worst_score.total_cmp(&b.worst_score),
        AccountSort::LastSession => a.last_session_started_at.cmp(&b.last_session_started_at),
    }
}

/// Stable in-place sort; equal keys keep their current relative order in
/// both directions.
pub fn sort_accounts(accounts: &mut [AccountInsight], field: AccountSort, order: SortOrder) {
    accounts.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, field),
        SortOrder::Desc => compare(b, a, field),
    });
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn insight(username: &str, sessions: usize, avg: f64, hours: i64) -> AccountInsight {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 19, 0, 0).unwrap();
        AccountInsight {
            username: username.to_string(),
            sessions_count: sessions,
            avg_score: avg,
            best_score: avg,
            worst_score: avg,
            avg_engagement_rate: 0.0,
            avg_retention_rate: 0.0,
            avg_engagement_velocity: 0.0,
            strength_factors: Vec::new(),
            weakness_factors: Vec::new(),
            best_session_id: format!("{username}-1"),
            best_session_started_at: t0,
            best_session_peak_viewers: 0,
            best_session_score: avg,
            last_session_score: avg,
            last_session_started_at: t0 + Duration::hours(hours),
        }
    }

    fn names(accounts: &[AccountInsight]) -> Vec<&str> {
        accounts.iter().map(|a| a.username.as_str()).collect()
    }

    #[test]
    fn sorts_by_avg_score_descending() {
        let mut rows = vec![
            insight("a", 1, 10.0, 0),
            insight("b", 1, 30.0, 0),
            insight("c", 1, 20.0, 0),
        ];
        sort_accounts(&mut rows, AccountSort::AvgScore, SortOrder::Desc);
        assert_eq!(names(&rows), vec!["b", "c", "a"]);
    }

    #[test]
    fn equal_keys_keep_relative_order() {
        let mut rows = vec![
            insight("z", 2, 1.0, 0),
            insight("a", 2, 1.0, 0),
            insight("m", 1, 1.0, 0),
        ];
        sort_accounts(&mut rows, AccountSort::Sessions, SortOrder::Desc);
        assert_eq!(names(&rows), vec!["z", "a", "m"]);
        sort_accounts(&mut rows, AccountSort::Sessions, SortOrder::Asc);
        assert_eq!(names(&rows), vec!["m", "z", "a"]);
    }

    #[test]
    fn nan_scores_do_not_panic() {
        let mut rows = vec![insight("a", 1, f64::NAN, 0), insight("b", 1, 5.0, 0)];
        sort_accounts(&mut rows, AccountSort::AvgScore, SortOrder::Asc);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn sorts_by_last_session_and_username() {
        let mut rows = vec![
            insight("b", 1, 0.0, 5),
            insight("a", 1, 0.0, 1),
            insight("c", 1, 0.0, 3),
        ];
        sort_accounts(&mut rows, AccountSort::LastSession, SortOrder::Desc);
        assert_eq!(names(&rows), vec!["b", "c", "a"]);
        sort_accounts(&mut rows, AccountSort::Username, SortOrder::Asc);
        assert_eq!(names(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_sort_field_and_order() {
        assert_eq!("avg_score".parse::<AccountSort>(), Ok(AccountSort::AvgScore));
        assert_eq!(" Best_Score ".parse::<AccountSort>(), Ok(AccountSort::BestScore));
        assert!("likes".parse::<AccountSort>().is_err());
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn default_order_is_descending() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }
}
