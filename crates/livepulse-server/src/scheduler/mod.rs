//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the live
//! snapshot recorder when it is enabled.

mod recorder;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use livepulse_core::AppConfig;
use livepulse_monitor::MonitorClient;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    monitor: MonitorClient,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if config.recorder_enabled {
        register_recorder_job(&scheduler, pool, &config, monitor).await?;
    } else {
        tracing::info!("scheduler: live snapshot recorder disabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Six-field cron expression firing every `interval_secs` seconds.
fn recorder_cron(interval_secs: u32) -> String {
    format!("*/{interval_secs} * * * * *")
}

/// Holds the recorder's running flag and clears it on drop, so a tick that
/// panics does not block every later tick.
struct TickGuard(Arc<AtomicBool>);

impl TickGuard {
    /// `None` while another tick holds the flag.
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(running)))
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Register the live snapshot recorder.
///
/// A tick that is still running when the next one fires causes that next
/// tick to be skipped.
async fn register_recorder_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: &AppConfig,
    monitor: MonitorClient,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let monitor = Arc::new(monitor);
    let max_concurrent = config.recorder_max_concurrent;
    let running = Arc::new(AtomicBool::new(false));
    let cron = recorder_cron(config.recorder_interval_secs);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let monitor = Arc::clone(&monitor);
        let running = Arc::clone(&running);

        Box::pin(async move {
            let Some(_guard) = TickGuard::acquire(&running) else {
                tracing::debug!("scheduler: previous recorder tick still running; skipping");
                return;
            };

            let outcome = recorder::run_recorder_tick(&pool, &monitor, max_concurrent).await;
            tracing::debug!(
                recorded = outcome.recorded,
                skipped = outcome.skipped,
                failed = outcome.failed,
                "scheduler: recorder tick complete"
            );
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        interval_secs = config.recorder_interval_secs,
        max_concurrent,
        "scheduler: live snapshot recorder registered"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_cron_uses_seconds_field() {
        assert_eq!(recorder_cron(5), "*/5 * * * * *");
        assert_eq!(recorder_cron(30), "*/30 * * * * *");
    }

    #[test]
    fn tick_guard_excludes_overlap_and_releases_on_drop() {
        let running = Arc::new(AtomicBool::new(false));
        let guard = TickGuard::acquire(&running).expect("first tick acquires");
        assert!(TickGuard::acquire(&running).is_none());
        drop(guard);
        assert!(TickGuard::acquire(&running).is_some());
    }

    #[tokio::test]
    async fn tick_guard_releases_when_tick_panics() {
        let running = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&running);
        let tick = tokio::spawn(async move {
            let _guard = TickGuard::acquire(&flag).expect("acquire");
            panic!("tick failed");
        });
        assert!(tick.await.is_err());
        assert!(!running.load(Ordering::Acquire));
        assert!(TickGuard::acquire(&running).is_some());
    }

    #[tokio::test]
    async fn recorder_cron_is_accepted_by_scheduler() {
        let job = Job::new_async(recorder_cron(5).as_str(), |_uuid, _lock| Box::pin(async {}));
        assert!(job.is_ok());
    }
}
