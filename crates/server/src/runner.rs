//! Background scheduler loop.
//!
//! Drives two independent recurring triggers: the ingestion pipeline at
//! the top of every minute and the retention sweep daily at midnight.
//! Firings of the same trigger are serialized skip-if-running; a run
//! that fails is logged and the loop keeps firing subsequent windows.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use sattrack_ingest::fetch::{HttpFetcher, PositionSource};
use sattrack_ingest::schedule::JobSchedule;
use sattrack_ingest::{run_ingestion, run_sweep};

use crate::state::AppState;

pub const INGEST_JOB: &str = "ingest-positions";
pub const SWEEP_JOB: &str = "sweep-positions";

/// Interval between schedule checks.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Start the scheduler. Idempotent: only the first call per process
/// spawns the loop; later calls log and return `false`.
pub fn start(state: Arc<AppState>) -> bool {
    if !state.mark_scheduler_started() {
        warn!("scheduler already started; ignoring duplicate start");
        return false;
    }
    tokio::spawn(run_loop(state));
    true
}

async fn run_loop(state: Arc<AppState>) {
    let tracker = &state.config.tracker;

    let mut jobs = JobSchedule::new();
    if let Err(e) = jobs.add_job(INGEST_JOB, &tracker.ingest_cron) {
        error!(error = %e, "cannot schedule ingestion trigger; scheduler not running");
        return;
    }
    if let Err(e) = jobs.add_job(SWEEP_JOB, &tracker.sweep_cron) {
        error!(error = %e, "cannot schedule retention trigger; scheduler not running");
        return;
    }

    let fetcher: Arc<dyn PositionSource> =
        match HttpFetcher::new(Duration::from_secs(tracker.fetch_timeout_secs)) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                error!(error = %e, "cannot build HTTP fetcher; scheduler not running");
                return;
            }
        };

    info!(
        ingest_cron = %tracker.ingest_cron,
        sweep_cron = %tracker.sweep_cron,
        "scheduler started"
    );

    let collect_timeout = Duration::from_secs(tracker.collect_timeout_secs);
    let ingest_gate = Arc::new(tokio::sync::Mutex::new(()));
    let sweep_gate = Arc::new(tokio::sync::Mutex::new(()));

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        interval.tick().await;
        let now = Utc::now();

        for job in jobs.due_jobs(now) {
            // A skipped firing still consumes its cron window.
            jobs.record_fired(&job, now);

            match job.as_str() {
                INGEST_JOB => {
                    let Ok(guard) = ingest_gate.clone().try_lock_owned() else {
                        warn!("previous ingestion run still in flight; skipping this window");
                        continue;
                    };
                    let state = state.clone();
                    let fetcher = fetcher.clone();
                    tokio::spawn(async move {
                        let _guard = guard;
                        match run_ingestion(&state.store, fetcher, collect_timeout).await {
                            Ok(summary) => info!(
                                satellites = summary.satellites,
                                succeeded = summary.succeeded,
                                failed = summary.failed,
                                written = summary.written,
                                "scheduled ingestion run finished"
                            ),
                            Err(e) => error!(error = %e, "ingestion run failed"),
                        }
                    });
                }
                SWEEP_JOB => {
                    let Ok(guard) = sweep_gate.clone().try_lock_owned() else {
                        warn!("previous retention sweep still in flight; skipping this window");
                        continue;
                    };
                    let state = state.clone();
                    tokio::spawn(async move {
                        let _guard = guard;
                        let retention = state.config.tracker.retention_days;
                        match run_sweep(&state.store, retention).await {
                            Ok(deleted) => info!(deleted, "scheduled retention sweep finished"),
                            Err(e) => error!(error = %e, "retention sweep failed"),
                        }
                    });
                }
                other => warn!(job = other, "unknown scheduled job id"),
            }
        }
    }
}
