//! HTTP API handlers.

pub mod auth;
pub mod common;
pub mod positions;
pub mod satellites;
pub mod selections;

use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
