//! Per-user position history read.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::common::{internal_error, ApiResult};

const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PositionView {
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct TrackedSatellite {
    satellite_id: Uuid,
    satellite_name: String,
}

/// GET /positions -- latest stored positions per actively tracked
/// satellite, keyed by satellite name.
pub async fn latest(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(q): Query<PositionsQuery>,
) -> ApiResult<Json<BTreeMap<String, Vec<PositionView>>>> {
    let pool = state.store.pool();
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100);

    let tracked = sqlx::query_as::<_, TrackedSatellite>(
        "SELECT sel.satellite_id, sat.name AS satellite_name
         FROM tracking_selections sel
         JOIN satellites sat ON sat.id = sel.satellite_id
         WHERE sel.user_id = $1 AND sel.is_active",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await
    .map_err(internal_error)?;

    let mut result = BTreeMap::new();
    for sat in tracked {
        let positions = sqlx::query_as::<_, PositionView>(
            "SELECT observed_at, latitude, longitude, altitude, velocity
             FROM satellite_positions
             WHERE user_id = $1 AND satellite_id = $2
             ORDER BY observed_at DESC
             LIMIT $3",
        )
        .bind(user.id)
        .bind(sat.satellite_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(internal_error)?;

        result.insert(sat.satellite_name, positions);
    }

    Ok(Json(result))
}
