use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);
    Router::new()
        .route("/health", get(api::health))
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/satellites", get(api::satellites::list))
        .route(
            "/selections",
            get(api::selections::list).post(api::selections::create),
        )
        .route("/selections/{id}", delete(api::selections::deactivate))
        .route("/positions", get(api::positions::latest))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    match parse_origin(origin) {
        Some(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

/// A configured origin of `*` means no restriction; so does a value that
/// is not a valid header value, after a warning.
fn parse_origin(origin: &str) -> Option<HeaderValue> {
    if origin == "*" {
        return None;
    }
    let value = origin.parse().ok();
    if value.is_none() {
        warn!(origin, "invalid CORS origin; allowing any origin");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origin_is_unrestricted() {
        assert!(parse_origin("*").is_none());
    }

    #[test]
    fn explicit_origin_is_parsed() {
        let value = parse_origin("https://tracker.example").unwrap();
        assert_eq!(value, "https://tracker.example");
    }

    #[test]
    fn garbage_origin_falls_back_to_unrestricted() {
        assert!(parse_origin("not\na\nheader").is_none());
    }
}
