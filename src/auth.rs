//! Password hashing, bearer-session tokens, and the `AuthUser` extractor.
//!
//! Tokens are opaque 32-byte random values handed to the client once;
//! the server stores only the SHA-256 digest, so a leaked database does
//! not leak usable credentials.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use chrono::Utc;
use ring::rand::SecureRandom;
use ring::{digest, pbkdf2, rand};
use thiserror::Error;

use crate::api::response::ApiError;
use crate::AppState;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;
const TOKEN_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Random generator failure")]
    Rng,
}

fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn base64_decode(data: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(data).ok()
}

// ============================================================================
// Password hashing (PBKDF2-HMAC-SHA256)
// ============================================================================

/// Hash a password into the stored "pbkdf2-sha256$iters$salt$hash" format.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let rng = rand::SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| AuthError::Rng)?;

    let mut hash = [0u8; HASH_LEN];
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).ok_or(AuthError::Rng)?;
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "pbkdf2-sha256${PBKDF2_ITERATIONS}${}${}",
        base64_encode(&salt),
        base64_encode(&hash)
    ))
}

/// Verify a password against a stored hash. Malformed stored values
/// verify as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (scheme, iterations, salt, hash) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(scheme), Some(iters), Some(salt), Some(hash), None) => {
            (scheme, iters, salt, hash)
        }
        _ => return false,
    };
    if scheme != "pbkdf2-sha256" {
        return false;
    }

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Some(salt), Some(hash)) = (base64_decode(salt), base64_decode(hash)) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

// ============================================================================
// Session tokens
// ============================================================================

/// Generate a fresh opaque bearer token (the value the client keeps).
pub fn generate_token() -> Result<String, AuthError> {
    let rng = rand::SystemRandom::new();
    let mut bytes = [0u8; TOKEN_LEN];
    rng.fill(&mut bytes).map_err(|_| AuthError::Rng)?;
    Ok(base64_encode(&bytes))
}

/// The session-table key for a token: its SHA-256 digest.
pub fn token_key(token: &str) -> String {
    let hash = digest::digest(&digest::SHA256, token.as_bytes());
    base64_encode(hash.as_ref())
}

// ============================================================================
// Request identity extractor
// ============================================================================

/// The authenticated caller, resolved from the bearer token on the request.
/// Handlers that require authentication take this as an argument; requests
/// without a valid, unexpired session are rejected with a 401 before the
/// handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    /// Digest key of the session that authenticated this request.
    pub session_key: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let token = header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        let key = token_key(token);
        let session = state
            .db
            .get_session(&key)
            .map_err(|e| ApiError::internal(e.to_string()))?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        if session.expires_at < Utc::now() {
            // Lazy cleanup; the 401 stands either way.
            if let Err(e) = state.db.delete_session(&key) {
                tracing::warn!(error = %e, "Failed to delete expired session");
            }
            return Err(ApiError::unauthorized(
                "Session expired, please log in again",
            ));
        }

        let user = state
            .db
            .get_user(&session.user_id)
            .map_err(|e| ApiError::internal(e.to_string()))?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            session_key: key,
        })
    }
}
