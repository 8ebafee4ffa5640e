//! Domain entities shared by the store, the ingestion pipeline, and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A satellite known to the system, with its upstream telemetry endpoint.
///
/// Immutable after creation except for `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Satellite {
    pub id: Uuid,
    pub name: String,
    /// External catalog number (e.g. NORAD id "25544" for the ISS).
    pub catalog_id: String,
    pub endpoint_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A registered account that can track satellites.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One user's declared intent to track one satellite.
///
/// At most one row exists per (user, satellite) pair; deactivating and
/// re-selecting flips `is_active` on the same row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrackingSelection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub satellite_id: Uuid,
    pub is_active: bool,
    pub selected_at: DateTime<Utc>,
}

/// One active selection row joined with its satellite identity, as read
/// at the start of an ingestion run.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveSelection {
    pub user_id: Uuid,
    pub satellite_id: Uuid,
    pub satellite_name: String,
    pub endpoint_url: String,
}

/// The canonical position tuple produced by the normalizer, regardless of
/// which upstream response shape it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedPosition {
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
}

/// A position record about to be written: one per (satellite, tracking user)
/// pair per successful fetch.
#[derive(Debug, Clone)]
pub struct NewPosition {
    pub satellite_id: Uuid,
    pub user_id: Uuid,
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
}

impl NewPosition {
    pub fn from_observation(satellite_id: Uuid, user_id: Uuid, obs: &ObservedPosition) -> Self {
        Self {
            satellite_id,
            user_id,
            observed_at: obs.observed_at,
            latitude: obs.latitude,
            longitude: obs.longitude,
            altitude: obs.altitude,
            velocity: obs.velocity,
        }
    }
}

/// A persisted position record as returned by the read API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PositionRecord {
    pub id: Uuid,
    pub satellite_id: Uuid,
    pub user_id: Uuid,
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub velocity: Option<f64>,
    pub ingested_at: DateTime<Utc>,
}
