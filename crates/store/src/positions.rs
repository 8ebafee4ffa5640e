//! Position record writes: batch insert and retention delete.

use chrono::{DateTime, Utc};

use sattrack_core::model::NewPosition;

use crate::{Store, StoreError};

impl Store {
    /// Insert one run's position records in a single batch statement.
    ///
    /// Empty input is a no-op. The insert is atomic: one invalid record
    /// fails the whole batch, which the caller surfaces as a run-level
    /// error.
    pub async fn insert_positions(&self, records: &[NewPosition]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO satellite_positions
             (satellite_id, user_id, observed_at, latitude, longitude, altitude, velocity) ",
        );
        builder.push_values(records, |mut row, rec| {
            row.push_bind(rec.satellite_id)
                .push_bind(rec.user_id)
                .push_bind(rec.observed_at)
                .push_bind(rec.latitude)
                .push_bind(rec.longitude)
                .push_bind(rec.altitude)
                .push_bind(rec.velocity);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete every position record ingested strictly before `cutoff`.
    /// A record whose ingestion timestamp equals the cutoff is retained.
    pub async fn delete_positions_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM satellite_positions WHERE ingested_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
