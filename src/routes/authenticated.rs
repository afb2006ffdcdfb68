use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Authenticated Router Module
///
/// Routes that need a valid bearer token. `create_router` wraps this router in the
/// `auth_middleware` layer, so every handler here receives a resolved `AuthUser`.
///
/// Ownership is not checked here: the services resolve the target first (404) and then
/// apply the `policy` rules (403).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        // The caller's own profile, re-read from the store.
        .route("/api/me", get(handlers::get_me))
        // GET /api/me/articles
        // The caller's active articles including drafts.
        .route("/api/me/articles", get(handlers::get_my_articles))
        // PATCH/DELETE /api/users/{id}
        // Profile update and account deletion. Owner only.
        .route(
            "/api/users/{id}",
            patch(handlers::update_user).delete(handlers::delete_user),
        )
        // POST /api/articles
        // Author is always the caller.
        .route("/api/articles", post(handlers::create_article))
        // PUT/PATCH/DELETE /api/articles/{id}
        // Updates are author-only; deletion also admits admins.
        .route(
            "/api/articles/{id}",
            put(handlers::update_article)
                .patch(handlers::update_article)
                .delete(handlers::delete_article),
        )
        // PATCH /api/articles/{id}/publish
        // Draft <-> Published toggle.
        .route("/api/articles/{id}/publish", patch(handlers::toggle_publish))
}
