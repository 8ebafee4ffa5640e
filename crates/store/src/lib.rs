//! PostgreSQL persistence for the tracker.
//!
//! The ingestion pipeline touches the store at exactly two points: a
//! read of the active selections at the start of a run and a batch
//! write (insert or sweep delete) at the end. No transaction ever spans
//! the network fetch phase in between.

mod error;
mod positions;
mod satellites;
mod selections;

pub use error::StoreError;

use sqlx::PgPool;

/// Handle over the connection pool. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
