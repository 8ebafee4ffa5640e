//! Recurring-job schedule state.
//!
//! Tracks a small fixed set of cron-driven jobs (the per-minute ingestion
//! trigger and the daily retention trigger) and answers, from a tick loop,
//! which jobs are due at a given instant. Each job fires independently of
//! the others.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expr}': {source}")]
    InvalidCron {
        expr: String,
        source: cron::error::Error,
    },
}

struct JobEntry {
    id: String,
    schedule: Schedule,
    last_fired: Option<DateTime<Utc>>,
}

/// Scheduling state for all registered jobs.
///
/// Call [`due_jobs`](JobSchedule::due_jobs) from the tick loop and
/// [`record_fired`](JobSchedule::record_fired) for each job it launches
/// (or deliberately skips), so the same cron window never fires twice.
#[derive(Default)]
pub struct JobSchedule {
    entries: Vec<JobEntry>,
}

impl JobSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job under a 6-field cron expression
    /// (`sec min hour day-of-month month day-of-week`).
    pub fn add_job(&mut self, id: impl Into<String>, cron_expr: &str) -> Result<(), ScheduleError> {
        let schedule = Schedule::from_str(cron_expr).map_err(|source| ScheduleError::InvalidCron {
            expr: cron_expr.to_string(),
            source,
        })?;
        self.entries.push(JobEntry {
            id: id.into(),
            schedule,
            last_fired: None,
        });
        Ok(())
    }

    /// Return the ids of all jobs due at `now`.
    ///
    /// A job is due when a scheduled tick falls after its last firing and
    /// at or before `now`. A job that has never fired waits for its next
    /// cron boundary rather than firing immediately at startup.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| is_due(&entry.schedule, now, entry.last_fired))
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Record that a job fired (or was skipped) at `at`.
    pub fn record_fired(&mut self, id: &str, at: DateTime<Utc>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.last_fired = Some(at);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check whether a schedule has a tick in `(since, now]`.
///
/// `schedule.after()` yields strictly-later ticks, so for a job that has
/// never fired we anchor at one second before `now`: the job fires when a
/// boundary arrives, not on registration.
fn is_due(schedule: &Schedule, now: DateTime<Utc>, last_fired: Option<DateTime<Utc>>) -> bool {
    let since = last_fired.unwrap_or(now - chrono::Duration::seconds(1));
    match schedule.after(&since).next() {
        Some(next) => next <= now,
        None => false,
    }
}
