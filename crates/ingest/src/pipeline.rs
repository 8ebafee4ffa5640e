//! Fan-out coordination: one ingestion run end to end.
//!
//! A run reads the active selections once, fetches each distinct
//! satellite exactly once regardless of how many users track it, and
//! expands every successful fetch into one record per tracking user.
//! Fetch failures are isolated per satellite; only the final batch
//! write can fail the run as a whole.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sattrack_core::model::{ActiveSelection, NewPosition, ObservedPosition};
use sattrack_store::{Store, StoreError};

use crate::fetch::{FetchError, PositionSource};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Counters for one completed ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct satellites dispatched (one fetch each).
    pub satellites: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Position records written by the batch insert.
    pub written: u64,
}

/// All users tracking one satellite, collapsed to a single upstream fetch.
#[derive(Debug, Clone)]
pub struct SatelliteGroup {
    pub satellite_id: Uuid,
    pub satellite_name: String,
    pub endpoint_url: String,
    pub user_ids: Vec<Uuid>,
}

/// Group active selections by satellite id. Three users tracking the same
/// satellite produce one group with three user ids, never three groups.
pub fn group_by_satellite(selections: &[ActiveSelection]) -> Vec<SatelliteGroup> {
    let mut groups: BTreeMap<Uuid, SatelliteGroup> = BTreeMap::new();
    for sel in selections {
        groups
            .entry(sel.satellite_id)
            .or_insert_with(|| SatelliteGroup {
                satellite_id: sel.satellite_id,
                satellite_name: sel.satellite_name.clone(),
                endpoint_url: sel.endpoint_url.clone(),
                user_ids: Vec::new(),
            })
            .user_ids
            .push(sel.user_id);
    }
    groups.into_values().collect()
}

/// Expand one successful fetch into one record per tracking user. All
/// records share the fetched position values and differ only in user id.
pub fn expand_records(group: &SatelliteGroup, obs: &ObservedPosition) -> Vec<NewPosition> {
    group
        .user_ids
        .iter()
        .map(|&user_id| NewPosition::from_observation(group.satellite_id, user_id, obs))
        .collect()
}

/// Dispatch one concurrent fetch per group and collect every result.
///
/// Each invocation is capped at `collect_timeout`; the cap applies inside
/// the spawned task, so one slow satellite never delays collection of the
/// others, and a timed-out or panicked task counts as a failure for that
/// satellite only.
pub async fn fetch_all(
    groups: Vec<SatelliteGroup>,
    source: Arc<dyn PositionSource>,
    collect_timeout: Duration,
) -> Vec<(SatelliteGroup, Result<ObservedPosition, FetchError>)> {
    let mut handles = Vec::with_capacity(groups.len());
    for group in groups {
        let source = Arc::clone(&source);
        let url = group.endpoint_url.clone();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(collect_timeout, source.fetch(&url)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::TimedOut(collect_timeout.as_secs())),
            }
        });
        handles.push((group, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (group, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(FetchError::Task(e.to_string())),
        };
        results.push((group, result));
    }
    results
}

/// One full ingestion run: load selections, fan out, expand, batch write.
///
/// Per-satellite failures are logged and excluded from the output; only a
/// failed batch insert surfaces as an error.
pub async fn run_ingestion(
    store: &Store,
    source: Arc<dyn PositionSource>,
    collect_timeout: Duration,
) -> Result<RunSummary, PipelineError> {
    let selections = store.active_selections().await?;
    if selections.is_empty() {
        info!("no active tracking selections; nothing to fetch");
        return Ok(RunSummary::default());
    }

    let groups = group_by_satellite(&selections);
    let dispatched = groups.len();
    info!(
        selections = selections.len(),
        satellites = dispatched,
        "dispatching satellite fetches"
    );

    let mut records = Vec::new();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for (group, result) in fetch_all(groups, source, collect_timeout).await {
        match result {
            Ok(obs) => {
                succeeded += 1;
                records.extend(expand_records(&group, &obs));
            }
            Err(e) => {
                failed += 1;
                warn!(
                    satellite = %group.satellite_name,
                    error = %e,
                    "satellite fetch failed"
                );
            }
        }
    }

    let written = store.insert_positions(&records).await?;
    info!(
        satellites = dispatched,
        succeeded, failed, written, "ingestion run complete"
    );

    Ok(RunSummary {
        satellites: dispatched,
        succeeded,
        failed,
        written,
    })
}

/// Delete position records ingested more than `retention_days` ago.
/// A record exactly at the cutoff is retained.
pub async fn run_sweep(store: &Store, retention_days: u32) -> Result<u64, PipelineError> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
    let deleted = store.delete_positions_before(cutoff).await?;
    info!(deleted, %cutoff, "retention sweep complete");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;

    fn selection(user: Uuid, satellite: Uuid, name: &str) -> ActiveSelection {
        ActiveSelection {
            user_id: user,
            satellite_id: satellite,
            satellite_name: name.to_string(),
            endpoint_url: format!("https://telemetry.test/{name}"),
        }
    }

    fn observation() -> ObservedPosition {
        ObservedPosition {
            observed_at: Utc.with_ymd_and_hms(2023, 11, 14, 0, 0, 0).unwrap(),
            latitude: 10.5,
            longitude: -20.1,
            altitude: Some(400.0),
            velocity: None,
        }
    }

    /// Counts invocations; fails for any URL listed in `failing`.
    struct StubSource {
        calls: AtomicUsize,
        failing: Vec<String>,
    }

    impl StubSource {
        fn new(failing: &[&str]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl PositionSource for StubSource {
        async fn fetch(&self, endpoint_url: &str) -> Result<ObservedPosition, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|f| endpoint_url.ends_with(f.as_str())) {
                return Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY));
            }
            Ok(observation())
        }
    }

    /// Never completes; exercises the collection timeout.
    struct HangingSource;

    #[async_trait::async_trait]
    impl PositionSource for HangingSource {
        async fn fetch(&self, _endpoint_url: &str) -> Result<ObservedPosition, FetchError> {
            std::future::pending().await
        }
    }

    #[test]
    fn grouping_collapses_users_per_satellite() {
        let iss = Uuid::new_v4();
        let hubble = Uuid::new_v4();
        let selections = vec![
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), hubble, "hubble"),
        ];

        let groups = group_by_satellite(&selections);
        assert_eq!(groups.len(), 2);

        let iss_group = groups.iter().find(|g| g.satellite_id == iss).unwrap();
        assert_eq!(iss_group.user_ids.len(), 3);
        let hubble_group = groups.iter().find(|g| g.satellite_id == hubble).unwrap();
        assert_eq!(hubble_group.user_ids.len(), 1);
    }

    #[test]
    fn grouping_empty_selections_is_empty() {
        assert!(group_by_satellite(&[]).is_empty());
    }

    #[test]
    fn expansion_yields_one_record_per_user() {
        let sat = Uuid::new_v4();
        let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let group = SatelliteGroup {
            satellite_id: sat,
            satellite_name: "iss".into(),
            endpoint_url: "https://telemetry.test/iss".into(),
            user_ids: users.clone(),
        };

        let obs = observation();
        let records = expand_records(&group, &obs);
        assert_eq!(records.len(), 3);
        for (rec, user) in records.iter().zip(&users) {
            assert_eq!(rec.user_id, *user);
            assert_eq!(rec.satellite_id, sat);
            assert_eq!(rec.latitude, obs.latitude);
            assert_eq!(rec.longitude, obs.longitude);
            assert_eq!(rec.altitude, obs.altitude);
            assert_eq!(rec.observed_at, obs.observed_at);
        }
    }

    #[tokio::test]
    async fn one_fetch_per_distinct_satellite() {
        let iss = Uuid::new_v4();
        let hubble = Uuid::new_v4();
        // 5 selections over 2 satellites must produce exactly 2 fetches.
        let selections = vec![
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), hubble, "hubble"),
            selection(Uuid::new_v4(), hubble, "hubble"),
        ];
        let source = Arc::new(StubSource::new(&[]));

        let groups = group_by_satellite(&selections);
        let results = fetch_all(groups, source.clone(), Duration::from_secs(15)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn partial_failure_keeps_other_satellites() {
        let iss = Uuid::new_v4();
        let hubble = Uuid::new_v4();
        let selections = vec![
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), iss, "iss"),
            selection(Uuid::new_v4(), hubble, "hubble"),
        ];
        let source = Arc::new(StubSource::new(&["hubble"]));

        let groups = group_by_satellite(&selections);
        let results = fetch_all(groups, source, Duration::from_secs(15)).await;

        let mut records = Vec::new();
        let mut failed = 0;
        for (group, result) in &results {
            match result {
                Ok(obs) => records.extend(expand_records(group, obs)),
                Err(_) => failed += 1,
            }
        }

        // Only the ISS trackers get records; exactly one failure.
        assert_eq!(failed, 1);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.satellite_id == iss));
    }

    #[tokio::test]
    async fn slow_satellite_times_out_without_blocking_others() {
        let slow = Uuid::new_v4();
        let groups = vec![SatelliteGroup {
            satellite_id: slow,
            satellite_name: "slow".into(),
            endpoint_url: "https://telemetry.test/slow".into(),
            user_ids: vec![Uuid::new_v4()],
        }];

        let results = fetch_all(groups, Arc::new(HangingSource), Duration::from_millis(20)).await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, Err(FetchError::TimedOut(_))));
    }
}
