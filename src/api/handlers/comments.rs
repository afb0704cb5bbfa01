use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::AuthUser;
use crate::storage::models::CommentRecord;
use crate::AppState;

const MAX_COMMENT_LEN: usize = 1000;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub resource_id: String,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub items: Vec<CommentResponse>,
    pub total: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<String>,
) -> Result<Json<JSend<CommentListResponse>>, ApiError> {
    state
        .db
        .get_resource(&resource_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    let comments = state
        .db
        .comments_for_resource(&resource_id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let mut items = Vec::with_capacity(comments.len());
    for comment in &comments {
        items.push(comment_to_response(&state, comment)?);
    }
    let total = items.len() as u64;

    Ok(JSend::success(CommentListResponse { items, total }))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    author: AuthUser,
    Path(resource_id): Path<String>,
    AppJson(req): AppJson<CreateCommentRequest>,
) -> Result<Json<JSend<CommentResponse>>, ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }
    // Bounded in characters, not bytes
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(ApiError::bad_request(format!(
            "Comment may not exceed {MAX_COMMENT_LEN} characters"
        )));
    }

    state
        .db
        .get_resource(&resource_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource_id.clone(),
        author_id: author.id.clone(),
        content: content.to_string(),
        created_at: Utc::now(),
    };

    state
        .db
        .put_comment(&comment)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(comment_id = %comment.id, resource_id = %resource_id, "Created comment");
    Ok(JSend::success(CommentResponse {
        id: comment.id,
        resource_id: comment.resource_id,
        content: comment.content,
        author: author.name,
        author_id: author.id,
        created_at: comment.created_at.to_rfc3339(),
    }))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let comment = state
        .db
        .get_comment(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.author_id != caller.id {
        return Err(ApiError::forbidden(
            "Only the author may delete this comment",
        ));
    }

    state
        .db
        .delete_comment(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(comment_id = %id, "Deleted comment");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn comment_to_response(
    state: &AppState,
    comment: &CommentRecord,
) -> Result<CommentResponse, ApiError> {
    let author = state
        .db
        .get_user(&comment.author_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map(|u| u.name)
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(CommentResponse {
        id: comment.id.clone(),
        resource_id: comment.resource_id.clone(),
        content: comment.content.clone(),
        author,
        author_id: comment.author_id.clone(),
        created_at: comment.created_at.to_rfc3339(),
    })
}
