//! Tracking selection reads and writes.

use uuid::Uuid;

use sattrack_core::model::{ActiveSelection, TrackingSelection};

use crate::{Store, StoreError};

impl Store {
    /// Load every active tracking selection joined with its satellite
    /// identity. Only satellites still marked active are returned; a
    /// selection pointing at a deactivated satellite is ignored.
    pub async fn active_selections(&self) -> Result<Vec<ActiveSelection>, StoreError> {
        let rows = sqlx::query_as::<_, ActiveSelection>(
            "SELECT sel.user_id, sel.satellite_id,
                    sat.name AS satellite_name, sat.endpoint_url
             FROM tracking_selections sel
             JOIN satellites sat ON sat.id = sel.satellite_id
             WHERE sel.is_active AND sat.is_active",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a selection, or reactivate the existing row for a previously
    /// deactivated (user, satellite) pair. Exactly one row exists per pair
    /// at all times.
    pub async fn upsert_selection(
        &self,
        user_id: Uuid,
        satellite_id: Uuid,
    ) -> Result<TrackingSelection, StoreError> {
        let selection = sqlx::query_as::<_, TrackingSelection>(
            "INSERT INTO tracking_selections (user_id, satellite_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, satellite_id) DO UPDATE SET is_active = TRUE
             RETURNING id, user_id, satellite_id, is_active, selected_at",
        )
        .bind(user_id)
        .bind(satellite_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(selection)
    }
}
