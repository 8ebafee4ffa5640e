//! Bearer-token authentication: password hashing, token issuance, and the
//! request extractor used by every protected endpoint.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::Json;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::common::{internal_error, unauthorized, ErrorResponse};
use crate::state::AppState;

/// Hash a password into a PHC string (`$argon2id$v=19$…`).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Mint a fresh opaque bearer token. Only its digest is stored.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Pull the bearer token out of an `Authorization` header, if any.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The authenticated caller, resolved from the `Authorization` header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(unauthorized)?;

        let digest = token_digest(token);
        sqlx::query_as::<_, AuthUser>(
            "SELECT u.id, u.username
             FROM users u
             JOIN api_tokens t ON t.user_id = u.id
             WHERE t.token_digest = $1",
        )
        .bind(&digest)
        .fetch_optional(state.store.pool())
        .await
        .map_err(internal_error)?
        .ok_or_else(unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("orbital-password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "orbital-password"));
        assert!(!verify_password(&hash, "wrong-password"));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("not-a-phc-string", "whatever"));
    }

    #[test]
    fn bearer_token_requires_the_bearer_scheme() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer tok-123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok-123"));
    }

    #[test]
    fn token_digest_is_stable_hex() {
        let token = new_token();
        let d1 = token_digest(&token);
        let d2 = token_digest(&token);
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
        assert_ne!(d1, token_digest("some-other-token"));
    }
}
