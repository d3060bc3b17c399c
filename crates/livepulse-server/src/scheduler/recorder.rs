//! One tick of the live snapshot recorder.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use livepulse_core::ActiveMonitor;
use livepulse_monitor::MonitorClient;
use sqlx::PgPool;

/// Per-tick counts, logged by the job and asserted by tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickOutcome {
    pub recorded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordResult {
    Recorded,
    Skipped,
    Failed,
}

/// Fetch every streaming monitor's metrics and persist them.
///
/// At most `max_concurrent` metric fetches run at once. A failure for one
/// account is logged and counted; it never aborts the rest of the tick.
pub(crate) async fn run_recorder_tick(
    pool: &PgPool,
    monitor: &MonitorClient,
    max_concurrent: usize,
) -> TickOutcome {
    let active = match monitor.active_monitors().await {
        Ok(active) => active,
        Err(e) => {
            tracing::warn!(error = %e, "recorder: failed to list active monitors");
            return TickOutcome::default();
        }
    };

    let mut outcome = TickOutcome::default();
    let streaming: Vec<ActiveMonitor> = active
        .monitors
        .into_iter()
        .filter(|m| {
            let keep = m.is_streaming && !m.username.trim().is_empty();
            if !keep {
                outcome.skipped += 1;
            }
            keep
        })
        .collect();

    if streaming.is_empty() {
        return outcome;
    }

    let results: Vec<RecordResult> = stream::iter(streaming)
        .map(|entry| record_one(pool, monitor, entry))
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    for result in results {
        match result {
            RecordResult::Recorded => outcome.recorded += 1,
            RecordResult::Skipped => outcome.skipped += 1,
            RecordResult::Failed => outcome.failed += 1,
        }
    }

    outcome
}

async fn record_one(pool: &PgPool, monitor: &MonitorClient, entry: ActiveMonitor) -> RecordResult {
    let mut snapshot = match monitor.live_metrics(&entry.username).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(
                username = %entry.username,
                error = %e,
                "recorder: metrics fetch failed"
            );
            return RecordResult::Failed;
        }
    };

    if !snapshot.is_streaming {
        tracing::debug!(username = %entry.username, "recorder: stream ended; skipping");
        return RecordResult::Skipped;
    }

    if snapshot.username.trim().is_empty() {
        snapshot.username = entry.username.clone();
    }
    if snapshot.session_id.trim().is_empty() {
        snapshot.session_id = entry.session_id.clone();
    }

    match livepulse_db::record_live_snapshot(pool, &snapshot, Utc::now()).await {
        Ok(_) => RecordResult::Recorded,
        Err(e) => {
            tracing::warn!(
                username = %entry.username,
                error = %e,
                "recorder: failed to persist snapshot"
            );
            RecordResult::Failed
        }
    }
}

#[cfg(test)]
#[path = "recorder_test.rs"]
mod tests;
