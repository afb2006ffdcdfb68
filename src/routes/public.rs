use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: liveness, registration and login, the user
/// directory and every read over published articles.
///
/// `/api/users/{id}` and `/api/articles/{id}` are shared with the authenticated router,
/// which adds the mutating methods on the same paths. On the article path the segment
/// is a slug for GET.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers. Returns "ok" without touching the store.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/register, POST /api/auth/login
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        // GET /api/users
        // Redacted directory of active users with published article counts.
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/users/{id}/articles", get(handlers::get_user_articles))
        // GET /api/articles
        // Published, non-deleted articles only, newest first.
        .route("/api/articles", get(handlers::list_articles))
        // Static segments take priority over the slug segment below.
        .route("/api/articles/search", get(handlers::search_articles))
        .route(
            "/api/articles/category/{category}",
            get(handlers::articles_by_category),
        )
        .route("/api/articles/{id}", get(handlers::get_article))
}
