use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::auth::AuthUser;
use crate::storage::models::{
    Level, ResourceFilter, ResourceListing, ResourceRecord, SortKey, SubjectRecord, VoteAction,
    VoteDirection,
};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub subject: String,
    pub level: Level,
    pub tags: String,
    pub upvotes: u64,
    pub downvotes: u64,
    pub author: String,
    pub author_id: String,
    pub comments: u64,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ResourceRequest {
    pub title: String,
    pub description: String,
    pub url: String,
    pub subject: String,
    pub level: Level,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListResourcesParams {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "sortBy")]
    pub sort_by: SortKey,
}

#[derive(Debug, Serialize)]
pub struct ResourceListResponse {
    pub items: Vec<ResourceResponse>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub action: VoteAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<VoteDirection>,
    pub upvotes: u64,
    pub downvotes: u64,
}

#[derive(Debug, Serialize)]
pub struct SubjectResponse {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Query-parameter sentinel meaning "no filter".
fn is_all(value: &str) -> bool {
    value.eq_ignore_ascii_case("all")
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListResourcesParams>,
) -> Result<Json<JSend<ResourceListResponse>>, ApiError> {
    let level = match params.level.as_deref().filter(|l| !is_all(l) && !l.is_empty()) {
        Some(raw) => Some(Level::parse(raw).ok_or_else(|| {
            ApiError::bad_request(
                "level must be one of beginner, basic, intermediate, advanced",
            )
        })?),
        None => None,
    };

    let filter = ResourceFilter {
        subject: params.subject.filter(|s| !is_all(s) && !s.is_empty()),
        level,
        search: params.search.filter(|s| !s.trim().is_empty()),
        sort: params.sort_by,
    };

    let listings = state
        .db
        .list_resources(&filter)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let total = listings.len() as u64;
    let items = listings.iter().map(listing_to_response).collect();

    Ok(JSend::success(ResourceListResponse { items, total }))
}

pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<ResourceResponse>>, ApiError> {
    let view = state
        .db
        .get_resource_view(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    Ok(JSend::success(listing_to_response(&view)))
}

pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    author: AuthUser,
    AppJson(req): AppJson<ResourceRequest>,
) -> Result<Json<JSend<ResourceResponse>>, ApiError> {
    let subject = validate_resource_request(&req)?;

    let subject = state
        .db
        .find_or_create_subject(&subject)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let resource = ResourceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        url: req.url.trim().to_string(),
        subject_id: subject.id,
        level: req.level,
        tags: req.tags.unwrap_or_default(),
        upvotes: 0,
        downvotes: 0,
        author_id: author.id.clone(),
        created_at: Utc::now(),
    };

    state
        .db
        .put_resource(&resource)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let view = state
        .db
        .get_resource_view(&resource.id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::internal("Resource not found after create"))?;

    tracing::debug!(resource_id = %resource.id, author_id = %author.id, "Created resource");
    Ok(JSend::success(listing_to_response(&view)))
}

pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<ResourceRequest>,
) -> Result<Json<JSend<ResourceResponse>>, ApiError> {
    let subject = validate_resource_request(&req)?;

    let existing = state
        .db
        .get_resource(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    if existing.author_id != caller.id {
        return Err(ApiError::forbidden(
            "Only the author may edit this resource",
        ));
    }

    let subject = state
        .db
        .find_or_create_subject(&subject)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let updated = state
        .db
        .update_resource(
            &id,
            req.title.trim(),
            req.description.trim(),
            req.url.trim(),
            &subject.id,
            req.level,
            req.tags.as_deref().unwrap_or_default(),
        )
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // The resource may have been deleted since the author check.
    if !updated {
        return Err(ApiError::not_found("Resource not found"));
    }

    let view = state
        .db
        .get_resource_view(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::internal("Resource not found after update"))?;

    tracing::debug!(resource_id = %id, "Updated resource");
    Ok(JSend::success(listing_to_response(&view)))
}

pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let existing = state
        .db
        .get_resource(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    if existing.author_id != caller.id {
        return Err(ApiError::forbidden(
            "Only the author may delete this resource",
        ));
    }

    // Comments and votes go with it, in the same transaction.
    state
        .db
        .delete_resource(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(resource_id = %id, "Deleted resource");
    Ok(JSend::success(()))
}

pub async fn vote_resource(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<VoteRequest>,
) -> Result<Json<JSend<VoteResponse>>, ApiError> {
    let outcome = state
        .db
        .cast_vote(&caller.id, &id, req.direction)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    tracing::debug!(
        resource_id = %id,
        user_id = %caller.id,
        action = ?outcome.action,
        "Vote cast"
    );

    Ok(JSend::success(VoteResponse {
        action: outcome.action,
        direction: outcome.direction,
        upvotes: outcome.upvotes,
        downvotes: outcome.downvotes,
    }))
}

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<SubjectResponse>>>, ApiError> {
    let subjects = state
        .db
        .list_subjects()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(JSend::success(
        subjects.iter().map(subject_to_response).collect(),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Shared validation for create and full-replace update.
/// Returns the trimmed subject name.
fn validate_resource_request(req: &ResourceRequest) -> Result<String, ApiError> {
    let subject = req.subject.trim();
    if req.title.trim().is_empty()
        || req.description.trim().is_empty()
        || req.url.trim().is_empty()
        || subject.is_empty()
    {
        return Err(ApiError::bad_request(
            "title, description, url, subject, and level are required",
        ));
    }

    if url::Url::parse(req.url.trim()).is_err() {
        return Err(ApiError::bad_request("url is not a valid URL"));
    }

    Ok(subject.to_string())
}

fn listing_to_response(view: &ResourceListing) -> ResourceResponse {
    ResourceResponse {
        id: view.id.clone(),
        title: view.title.clone(),
        description: view.description.clone(),
        url: view.url.clone(),
        subject: view.subject.clone(),
        level: view.level,
        tags: view.tags.clone(),
        upvotes: view.upvotes,
        downvotes: view.downvotes,
        author: view.author.clone(),
        author_id: view.author_id.clone(),
        comments: view.comments,
        created_at: view.created_at.to_rfc3339(),
    }
}

fn subject_to_response(subject: &SubjectRecord) -> SubjectResponse {
    SubjectResponse {
        id: subject.id.clone(),
        name: subject.name.clone(),
        category: subject.category.clone(),
    }
}
