//! Registration and login endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use sattrack_core::model::User;

use crate::auth;
use crate::state::AppState;

use super::common::{bad_request, internal_error, unauthorized, ApiResult};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

/// POST /auth/register -- create an account and issue a bearer token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(bad_request("username must not be empty"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = auth::hash_password(&req.password).map_err(internal_error)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash)
         VALUES ($1, $2, $3)
         RETURNING id, username, email, password_hash, created_at",
    )
    .bind(username)
    .bind(&req.email)
    .bind(&password_hash)
    .fetch_one(state.store.pool())
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            bad_request("username already taken")
        }
        other => internal_error(other),
    })?;

    let token = issue_token(&state, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserView {
                username: user.username,
                email: user.email,
            },
            token,
        }),
    ))
}

/// POST /auth/login -- verify credentials and issue a fresh token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at
         FROM users WHERE username = $1",
    )
    .bind(req.username.trim())
    .fetch_optional(state.store.pool())
    .await
    .map_err(internal_error)?
    .ok_or_else(unauthorized)?;

    if !auth::verify_password(&user.password_hash, &req.password) {
        return Err(unauthorized());
    }

    let token = issue_token(&state, user.id).await?;
    Ok(Json(AuthResponse {
        user: UserView {
            username: user.username,
            email: user.email,
        },
        token,
    }))
}

/// POST /auth/logout -- revoke the presented bearer token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = auth::bearer_token(&headers).ok_or_else(unauthorized)?;

    let result = sqlx::query("DELETE FROM api_tokens WHERE token_digest = $1")
        .bind(auth::token_digest(token))
        .execute(state.store.pool())
        .await
        .map_err(internal_error)?;

    if result.rows_affected() == 0 {
        return Err(unauthorized());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn issue_token(state: &AppState, user_id: uuid::Uuid) -> ApiResult<String> {
    let token = auth::new_token();
    sqlx::query("INSERT INTO api_tokens (token_digest, user_id) VALUES ($1, $2)")
        .bind(auth::token_digest(&token))
        .bind(user_id)
        .execute(state.store.pool())
        .await
        .map_err(internal_error)?;
    Ok(token)
}
