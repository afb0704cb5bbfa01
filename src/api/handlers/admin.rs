use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub users_deleted: u64,
    pub subjects_deleted: u64,
    pub resources_deleted: u64,
    pub comments_deleted: u64,
    pub votes_deleted: u64,
    pub sessions_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state
        .db
        .purge_all()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        users = stats.users,
        resources = stats.resources,
        "Purged all data"
    );

    Ok(JSend::success(PurgeResponse {
        users_deleted: stats.users,
        subjects_deleted: stats.subjects,
        resources_deleted: stats.resources,
        comments_deleted: stats.comments,
        votes_deleted: stats.votes,
        sessions_deleted: stats.sessions,
    }))
}
