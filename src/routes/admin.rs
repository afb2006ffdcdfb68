use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Read access over every active article, drafts included. Mounted behind the same
/// authentication layer as the authenticated router; the handlers then require the
/// `ADMIN` role and answer 403 otherwise.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/articles/admin/all
        // All active articles, most recently updated first.
        .route("/api/articles/admin/all", get(handlers::admin_list_articles))
        // GET /api/articles/admin/{id}
        .route("/api/articles/admin/{id}", get(handlers::admin_get_article))
}
