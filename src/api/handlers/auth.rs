use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::{self, AuthUser};
use crate::storage::models::{SessionRecord, UserRecord};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<JSend<AuthResponse>>, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_string();

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request(
            "name, email, and password are required",
        ));
    }
    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash =
        auth::hash_password(&req.password).map_err(|e| ApiError::internal(e.to_string()))?;

    let user = UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        password_hash,
        created_at: Utc::now(),
    };

    let user = state
        .db
        .create_user(&user)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::conflict("Email is already registered"))?;

    let token = open_session(&state, &user.id)?;

    tracing::debug!(user_id = %user.id, "Registered user");
    Ok(JSend::success(AuthResponse {
        token,
        user: user_to_response(&user),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<AuthResponse>>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    // Same response for unknown email and wrong password.
    let user = state
        .db
        .get_user_by_email(req.email.trim())
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = open_session(&state, &user.id)?;

    tracing::debug!(user_id = %user.id, "User logged in");
    Ok(JSend::success(AuthResponse {
        token,
        user: user_to_response(&user),
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    let user = state
        .db
        .get_user(&caller.id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(JSend::success(user_to_response(&user)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .db
        .delete_session(&caller.session_key)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(user_id = %caller.id, "User logged out");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn open_session(state: &AppState, user_id: &str) -> Result<String, ApiError> {
    let token = auth::generate_token().map_err(|e| ApiError::internal(e.to_string()))?;
    let now = Utc::now();
    let session = SessionRecord {
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: now + Duration::hours(state.config.session_ttl_hours),
    };

    state
        .db
        .put_session(&auth::token_key(&token), &session)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(token)
}

/// Lightweight email-shape check, same spirit as the classic
/// `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
fn valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn user_to_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}
