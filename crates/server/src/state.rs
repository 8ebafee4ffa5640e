use std::sync::atomic::{AtomicBool, Ordering};

use sattrack_core::Config;
use sattrack_store::Store;

/// Process-wide shared state handed to API handlers and the scheduler.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    scheduler_started: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config,
            store,
            scheduler_started: AtomicBool::new(false),
        }
    }

    /// Flip the started flag; returns `true` only for the first caller,
    /// which makes scheduler startup idempotent per process.
    pub fn mark_scheduler_started(&self) -> bool {
        !self.scheduler_started.swap(true, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn state() -> AppState {
        // connect_lazy builds a pool without touching the network.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/sattrack")
            .unwrap();
        AppState::new(Config::from_env(), Store::new(pool))
    }

    #[tokio::test]
    async fn scheduler_start_is_claimed_exactly_once() {
        let state = state();
        assert!(state.mark_scheduler_started());
        assert!(!state.mark_scheduler_started());
        assert!(!state.mark_scheduler_started());
    }
}
