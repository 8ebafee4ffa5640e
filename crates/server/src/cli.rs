//! CLI argument parsing and subcommand dispatch.
//!
//! Maintenance commands run one-shot against the database and exit; none
//! of them start the scheduler. Only `serve` does.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use sattrack_ingest::fetch::HttpFetcher;
use sattrack_ingest::{run_ingestion, run_sweep};
use sattrack_store::Store;

/// The seed catalog installed by `init-satellites`.
const SEED_SATELLITES: &[(&str, &str, &str)] = &[
    (
        "ISS (International Space Station)",
        "25544",
        "https://api.wheretheiss.at/v1/satellites/25544",
    ),
    (
        "Hubble Space Telescope",
        "20580",
        "https://api.satellitemap.space/v1/20580/position",
    ),
];

/// Parse CLI arguments and dispatch to the appropriate subcommand.
///
/// Returns `Ok(true)` if a subcommand was handled, `Ok(false)` if `serve`
/// should be started (handled by the caller).
pub async fn dispatch(config: &sattrack_core::Config, args: &[String]) -> anyhow::Result<bool> {
    match args.get(1).map(|s| s.as_str()) {
        Some("init-satellites") => {
            let store = connect(config).await?;
            for &(name, catalog_id, endpoint_url) in SEED_SATELLITES {
                let sat = store.upsert_satellite(name, catalog_id, endpoint_url).await?;
                info!(name = %sat.name, catalog_id = %sat.catalog_id, "satellite ready");
            }
            Ok(true)
        }
        Some("run-once") => {
            let store = connect(config).await?;
            let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
                config.tracker.fetch_timeout_secs,
            ))?);
            let summary = run_ingestion(
                &store,
                fetcher,
                Duration::from_secs(config.tracker.collect_timeout_secs),
            )
            .await?;
            info!(
                satellites = summary.satellites,
                succeeded = summary.succeeded,
                failed = summary.failed,
                written = summary.written,
                "one-shot ingestion run finished"
            );
            Ok(true)
        }
        Some("sweep") => {
            let days = args
                .get(2)
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.tracker.retention_days);
            let store = connect(config).await?;
            let deleted = run_sweep(&store, days).await?;
            info!(deleted, retention_days = days, "one-shot sweep finished");
            Ok(true)
        }
        Some("serve") => Ok(false),
        _ => {
            println!("sattrack v0.1.0");
            println!("Usage: sattrack-server <command>");
            println!("  serve              Start the HTTP server and scheduler");
            println!("  init-satellites    Seed the satellite catalog (ISS, Hubble)");
            println!("  run-once           Run one ingestion pipeline pass and exit");
            println!("  sweep [days]       Delete position records older than [days]");
            Ok(true)
        }
    }
}

async fn connect(config: &sattrack_core::Config) -> anyhow::Result<Store> {
    let pool = crate::db::init_pg_pool(&config.postgres).await?;
    Ok(Store::new(pool))
}
