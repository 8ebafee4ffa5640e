//! Tracking selection CRUD.
//!
//! The 2-active-selection cap lives here, at the API boundary; the
//! ingestion pipeline only ever reads the active subset. Reactivating a
//! previously deactivated (user, satellite) pair updates the existing
//! row via upsert, so exactly one row exists per pair at all times.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sattrack_core::model::Satellite;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::common::{bad_request, internal_error, not_found, ApiResult};

/// Maximum simultaneously active selections per user.
const MAX_ACTIVE_SELECTIONS: i64 = 2;

#[derive(Debug, Deserialize)]
pub struct CreateSelectionRequest {
    pub satellite_id: Uuid,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SelectionView {
    pub id: Uuid,
    pub satellite_id: Uuid,
    pub satellite_name: String,
    pub selected_at: DateTime<Utc>,
    pub is_active: bool,
}

/// GET /selections -- the caller's active selections.
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<SelectionView>>> {
    let selections = sqlx::query_as::<_, SelectionView>(
        "SELECT sel.id, sel.satellite_id, sat.name AS satellite_name,
                sel.selected_at, sel.is_active
         FROM tracking_selections sel
         JOIN satellites sat ON sat.id = sel.satellite_id
         WHERE sel.user_id = $1 AND sel.is_active
         ORDER BY sel.selected_at",
    )
    .bind(user.id)
    .fetch_all(state.store.pool())
    .await
    .map_err(internal_error)?;

    Ok(Json(selections))
}

/// POST /selections -- start tracking a satellite.
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateSelectionRequest>,
) -> ApiResult<(StatusCode, Json<SelectionView>)> {
    let pool = state.store.pool();

    let satellite = sqlx::query_as::<_, Satellite>(
        "SELECT id, name, catalog_id, endpoint_url, is_active, created_at
         FROM satellites WHERE id = $1 AND is_active",
    )
    .bind(req.satellite_id)
    .fetch_optional(pool)
    .await
    .map_err(internal_error)?
    .ok_or_else(|| not_found("satellite"))?;

    let already_active = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM tracking_selections
            WHERE user_id = $1 AND satellite_id = $2 AND is_active
         )",
    )
    .bind(user.id)
    .bind(satellite.id)
    .fetch_one(pool)
    .await
    .map_err(internal_error)?;
    if already_active {
        return Err(bad_request("you are already tracking this satellite"));
    }

    let active_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tracking_selections WHERE user_id = $1 AND is_active",
    )
    .bind(user.id)
    .fetch_one(pool)
    .await
    .map_err(internal_error)?;
    if active_count >= MAX_ACTIVE_SELECTIONS {
        return Err(bad_request(format!(
            "you can only track {MAX_ACTIVE_SELECTIONS} satellites at a time; deactivate one first"
        )));
    }

    // One row per (user, satellite): a previously deactivated pair is
    // reactivated in place, never duplicated.
    let selection = state
        .store
        .upsert_selection(user.id, satellite.id)
        .await
        .map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SelectionView {
            id: selection.id,
            satellite_id: selection.satellite_id,
            satellite_name: satellite.name,
            selected_at: selection.selected_at,
            is_active: selection.is_active,
        }),
    ))
}

/// DELETE /selections/{id} -- stop tracking (deactivates, keeps the row).
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deactivated = sqlx::query_scalar::<_, Uuid>(
        "UPDATE tracking_selections
         SET is_active = FALSE
         WHERE id = $1 AND user_id = $2 AND is_active
         RETURNING id",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(state.store.pool())
    .await
    .map_err(internal_error)?;

    match deactivated {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found("selection")),
    }
}
