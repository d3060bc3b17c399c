//! Read-only analytics commands: render the engine's output as tables or JSON.

use std::io::{self, Write};

use livepulse_analytics::{
    sort_accounts, AccountSeries, AccountSort, AnalyticsEngine, AnalyticsSummary, Factor,
    Narrative, NarrativeGenerator, SessionReader, SortOrder,
};

/// Print the global summary and the account table.
///
/// # Errors
///
/// Returns an error if the session read fails or JSON encoding fails.
pub(crate) async fn run_summary<R: SessionReader>(
    engine: &AnalyticsEngine<R>,
    sort: Option<(AccountSort, SortOrder)>,
    json: bool,
) -> anyhow::Result<()> {
    let mut summary = engine.summary().await?;
    if let Some((field, order)) = sort {
        sort_accounts(&mut summary.accounts, field, order);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render_summary(&mut io::stdout().lock(), &summary)?;
    }
    Ok(())
}

/// Print one account's per-session series.
///
/// # Errors
///
/// Returns an error if the session read fails or JSON encoding fails.
pub(crate) async fn run_account<R: SessionReader>(
    engine: &AnalyticsEngine<R>,
    username: &str,
    json: bool,
) -> anyhow::Result<()> {
    let series = engine.account_series(username).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        render_account(&mut io::stdout().lock(), &series)?;
    }
    Ok(())
}

/// Generate and print a narrative report for one account.
///
/// # Errors
///
/// Returns an error if the session read fails or the generator fails.
pub(crate) async fn run_narrative<R: SessionReader, G: NarrativeGenerator>(
    engine: &AnalyticsEngine<R>,
    generator: &G,
    username: &str,
) -> anyhow::Result<()> {
    let narrative = engine.narrative(username, generator).await?;
    render_narrative(&mut io::stdout().lock(), &narrative)?;
    Ok(())
}

fn factor_list(factors: &[Factor]) -> String {
    if factors.is_empty() {
        return "\u{2014}".to_string();
    }
    factors
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn factor_value(factor: Factor, value: f64) -> String {
    if factor.is_computed() {
        format!("{value:.1}")
    } else {
        format!("{value:.1}*")
    }
}

pub(crate) fn render_summary(
    out: &mut impl Write,
    summary: &AnalyticsSummary,
) -> io::Result<()> {
    let g = &summary.global;

    writeln!(out, "Accounts: {}   Sessions: {}", g.total_accounts, g.total_sessions)?;
    writeln!(
        out,
        "Avg score: {:.2}   Best: {:.2}   Median: {:.2}",
        g.avg_score_all, g.best_score_overall, g.median_score
    )?;
    writeln!(
        out,
        "Factors: engagement {:.1}  retention {:.1}  quality {:.1}  monetization {}  follow {}",
        g.engagement_factor,
        g.retention_factor,
        g.quality_factor,
        factor_value(Factor::Monetization, g.monetization_factor),
        factor_value(Factor::Follow, g.follow_factor),
    )?;
    if !g.pending_factors.is_empty() {
        writeln!(out, "  * not computed yet")?;
    }

    if summary.accounts.is_empty() {
        writeln!(out)?;
        writeln!(out, "no sessions recorded yet")?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<25}{:<10}{:<9}{:<9}{:<9}{:<9}{:<28}WEAKNESSES",
        "USERNAME", "SESSIONS", "AVG", "BEST", "WORST", "LAST", "STRENGTHS"
    )?;
    for account in &summary.accounts {
        writeln!(
            out,
            "{:<25}{:<10}{:<9.2}{:<9.2}{:<9.2}{:<9.2}{:<28}{}",
            account.username,
            account.sessions_count,
            account.avg_score,
            account.best_score,
            account.worst_score,
            account.last_session_score,
            factor_list(&account.strength_factors),
            factor_list(&account.weakness_factors),
        )?;
    }
    Ok(())
}

pub(crate) fn render_account(out: &mut impl Write, series: &AccountSeries) -> io::Result<()> {

    if series.sessions.is_empty() {
        writeln!(out, "no sessions found for @{}", series.username)?;
        return Ok(());
    }

    writeln!(out, "@{}: {} session(s)", series.username, series.sessions.len())?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<25}{:<18}{:<9}{:<9}{:<9}{:<9}LIKES",
        "SESSION", "STARTED", "SAMPLES", "LAST", "BEST", "PEAK"
    )?;
    for session in &series.sessions {
        let started = session.started_at.format("%Y-%m-%d %H:%M").to_string();
        let best = session.scores.iter().copied().reduce(f64::max).unwrap_or(0.0);
        writeln!(
            out,
            "{:<25}{:<18}{:<9}{:<9.2}{:<9.2}{:<9}{}",
            session.session_id,
            started,
            session.scores.len(),
            session.last_score,
            best,
            session.peak_viewers,
            session.total_likes,
        )?;
    }
    Ok(())
}

pub(crate) fn render_narrative(out: &mut impl Write, narrative: &Narrative) -> io::Result<()> {
    match &narrative.analysis {
        Some(text) => writeln!(
            out,
            "@{} ({} session(s) analyzed)\n\n{}",
            narrative.username, narrative.sessions_analyzed, text
        ),
        None => writeln!(
            out,
            "no sessions found for @{}; nothing to analyze",
            narrative.username
        ),
    }
}
