//! Satellite catalog maintenance (admin/seed workflow).

use sattrack_core::model::Satellite;

use crate::{Store, StoreError};

impl Store {
    /// Insert a satellite or refresh its name and endpoint if the catalog
    /// id is already known. Used by the `init-satellites` maintenance
    /// command; the active flag of an existing row is left untouched.
    pub async fn upsert_satellite(
        &self,
        name: &str,
        catalog_id: &str,
        endpoint_url: &str,
    ) -> Result<Satellite, StoreError> {
        let satellite = sqlx::query_as::<_, Satellite>(
            "INSERT INTO satellites (name, catalog_id, endpoint_url)
             VALUES ($1, $2, $3)
             ON CONFLICT (catalog_id) DO UPDATE
                SET name = EXCLUDED.name,
                    endpoint_url = EXCLUDED.endpoint_url
             RETURNING id, name, catalog_id, endpoint_url, is_active, created_at",
        )
        .bind(name)
        .bind(catalog_id)
        .bind(endpoint_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(satellite)
    }
}
