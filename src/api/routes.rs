use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Auth
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        // Resources
        .route("/resources", get(handlers::list_resources))
        .route("/resources", post(handlers::create_resource))
        .route("/resources/:id", get(handlers::get_resource))
        .route("/resources/:id", put(handlers::update_resource))
        .route("/resources/:id", delete(handlers::delete_resource))
        .route("/resources/:id/vote", post(handlers::vote_resource))
        // Comments
        .route("/resources/:id/comments", get(handlers::list_comments))
        .route("/resources/:id/comments", post(handlers::create_comment))
        .route("/comments/:id", delete(handlers::delete_comment))
        // Subjects (filter UI)
        .route("/subjects", get(handlers::list_subjects))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
