//! Satellite position ingestion pipeline.
//!
//! A scheduled run loads every active tracking selection, groups it by
//! satellite so each satellite is fetched exactly once, dispatches the
//! fetches concurrently, normalizes the heterogeneous upstream response
//! shapes into one canonical record form, and expands every successful
//! fetch into one persisted position record per tracking user. A separate
//! daily run retires records past their retention age.

pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod schedule;

pub use fetch::{FetchError, HttpFetcher, PositionSource};
pub use normalize::{normalize, NormalizeError};
pub use pipeline::{run_ingestion, run_sweep, PipelineError, RunSummary};
pub use schedule::{JobSchedule, ScheduleError};
