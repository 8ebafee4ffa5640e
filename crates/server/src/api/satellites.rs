//! Satellite catalog listing.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use sattrack_core::model::Satellite;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::common::{internal_error, ApiResult};

/// GET /satellites -- list the active satellite catalog.
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<Satellite>>> {
    let satellites = sqlx::query_as::<_, Satellite>(
        "SELECT id, name, catalog_id, endpoint_url, is_active, created_at
         FROM satellites
         WHERE is_active
         ORDER BY name",
    )
    .fetch_all(state.store.pool())
    .await
    .map_err(internal_error)?;

    Ok(Json(satellites))
}
