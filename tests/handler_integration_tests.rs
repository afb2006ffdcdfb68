use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use quillpost::{
    AppState, InMemoryRepository, create_router,
    auth::AuthUser,
    config::AppConfig,
    error::ErrorBody,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    handlers::{self, SearchParams},
    models::{
        CreateArticleRequest, LoginRequest, NewUser, RegisterRequest, Role, UpdateArticleRequest,
        UpdateUserRequest,
    },
    repository::Repository,
};
use std::sync::Arc;
use tokio::test;
use tower::ServiceExt;
use uuid::Uuid;

// --- TEST UTILITIES ---

// Creates an AppState over a fresh in-memory store, returning the store handle too.
fn create_test_state() -> (AppState, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    (AppState::new(repo.clone(), AppConfig::default()), repo)
}

async fn seed(repo: &InMemoryRepository, name: &str, role: Role) -> AuthUser {
    let user = repo
        .create_user(NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "placeholder".to_string(),
            role,
        })
        .await
        .unwrap();
    AuthUser::from(&user)
}

fn article_payload(title: &str, published: bool) -> CreateArticleRequest {
    CreateArticleRequest {
        title: title.to_string(),
        image_url: "https://images.example.com/cover.png".to_string(),
        category: "Technology".to_string(),
        description: "A description that is long enough.".to_string(),
        content: "Paragraph of text. ".repeat(5),
        published,
    }
}

async fn error_body(response: axum::response::Response) -> (StatusCode, ErrorBody) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- HANDLER TESTS ---

#[test]
async fn test_register_returns_created_with_token() {
    let (state, _repo) = create_test_state();

    let payload = RegisterRequest {
        name: "New Reader".to_string(),
        email: "Reader@Example.com".to_string(),
        password: "password123".to_string(),
    };
    let (status, Json(body)) = handlers::register(State(state.clone()), ValidatedJson(payload))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert!(body.success);
    assert_eq!(body.message.as_deref(), Some("User created successfully"));
    assert_eq!(body.data.user.email, "reader@example.com");
    assert_eq!(body.data.user.role, Role::User);
    assert_eq!(state.tokens.verify(&body.data.token).unwrap().sub, body.data.user.id);
}

#[test]
async fn test_login_rejects_bad_credentials_with_401() {
    let (state, _repo) = create_test_state();

    let result = handlers::login(
        State(state),
        ValidatedJson(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await;

    let (status, body) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.message, "Invalid email or password");
}

#[test]
async fn test_create_article_is_authored_by_caller() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Author", Role::User).await;

    let (status, Json(body)) = handlers::create_article(
        author.clone(),
        State(state),
        ValidatedJson(article_payload("Handlers In Practice", false)),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message.as_deref(), Some("Article created successfully"));
    assert_eq!(body.data.author.id, author.id);
    assert_eq!(body.data.author.name, "Author");
    assert_eq!(body.data.slug, "handlers-in-practice");
    assert!(!body.data.published);
}

#[test]
async fn test_get_article_by_slug_hides_drafts() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Drafter", Role::User).await;
    handlers::create_article(
        author,
        State(state.clone()),
        ValidatedJson(article_payload("Unfinished Thoughts", false)),
    )
    .await
    .unwrap();

    let result = handlers::get_article(State(state), ApiPath("unfinished-thoughts".to_string())).await;

    let (status, body) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.message, "Article not found");
}

#[test]
async fn test_update_article_forbidden_for_non_author() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Owner", Role::User).await;
    let other = seed(&repo, "Other", Role::User).await;
    let (_, Json(created)) = handlers::create_article(
        author,
        State(state.clone()),
        ValidatedJson(article_payload("Protected Piece", true)),
    )
    .await
    .unwrap();

    let result = handlers::update_article(
        other,
        State(state),
        ApiPath(created.data.id),
        ValidatedJson(UpdateArticleRequest {
            title: Some("Taken over title".to_string()),
            ..Default::default()
        }),
    )
    .await;

    let (status, body) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.success);
}

#[test]
async fn test_toggle_publish_reports_new_state() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Publisher", Role::User).await;
    let (_, Json(created)) = handlers::create_article(
        author.clone(),
        State(state.clone()),
        ValidatedJson(article_payload("Ready For Readers", false)),
    )
    .await
    .unwrap();

    let Json(body) = handlers::toggle_publish(author, State(state.clone()), ApiPath(created.data.id))
        .await
        .unwrap();

    assert!(body.data.published);
    assert_eq!(body.message.as_deref(), Some("Article published successfully"));

    let Json(listing) = handlers::list_articles(State(state)).await.unwrap();
    assert_eq!(listing.data.len(), 1);
    assert_eq!(listing.data[0].slug, "ready-for-readers");
}

#[test]
async fn test_admin_delete_override() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Writer", Role::User).await;
    let admin = seed(&repo, "Admin", Role::Admin).await;
    let (_, Json(created)) = handlers::create_article(
        author,
        State(state.clone()),
        ValidatedJson(article_payload("Needs Moderation", true)),
    )
    .await
    .unwrap();

    let Json(body) = handlers::delete_article(admin, State(state.clone()), ApiPath(created.data.id))
        .await
        .unwrap();

    assert!(body.success);
    assert_eq!(body.message, "Article deleted successfully");
    let Json(listing) = handlers::list_articles(State(state)).await.unwrap();
    assert!(listing.data.is_empty());
}

#[test]
async fn test_get_admin_articles_forbidden() {
    let (state, repo) = create_test_state();
    let reader = seed(&repo, "Reader", Role::User).await;

    let result = handlers::admin_list_articles(reader, State(state)).await;

    let (status, _) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[test]
async fn test_get_admin_articles_includes_drafts() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Author", Role::User).await;
    let admin = seed(&repo, "Admin", Role::Admin).await;
    let (_, Json(draft)) = handlers::create_article(
        author,
        State(state.clone()),
        ValidatedJson(article_payload("Hidden Draft", false)),
    )
    .await
    .unwrap();

    let Json(all) = handlers::admin_list_articles(admin.clone(), State(state.clone()))
        .await
        .unwrap();
    assert_eq!(all.data.len(), 1);
    assert!(!all.data[0].published);

    let Json(one) = handlers::admin_get_article(admin, State(state), ApiPath(draft.data.id))
        .await
        .unwrap();
    assert_eq!(one.data.title, "Hidden Draft");
}

#[test]
async fn test_search_without_query_is_bad_request() {
    let (state, _repo) = create_test_state();

    let result = handlers::search_articles(State(state), ApiQuery(SearchParams::default())).await;

    let (status, body) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.message, "Search query is required");
}

#[test]
async fn test_category_listing_ignores_case() {
    let (state, repo) = create_test_state();
    let author = seed(&repo, "Categorist", Role::User).await;
    handlers::create_article(
        author,
        State(state.clone()),
        ValidatedJson(article_payload("Filed Under Tech", true)),
    )
    .await
    .unwrap();

    let Json(body) = handlers::articles_by_category(State(state), ApiPath("TECHNOLOGY".to_string()))
        .await
        .unwrap();

    assert_eq!(body.data.len(), 1);
}

#[test]
async fn test_get_me_and_user_directory() {
    let (state, repo) = create_test_state();
    let me = seed(&repo, "Myself", Role::User).await;
    seed(&repo, "Neighbour", Role::User).await;

    let Json(profile) = handlers::get_me(me.clone(), State(state.clone())).await.unwrap();
    assert_eq!(profile.data.id, me.id);
    assert_eq!(profile.data.email, "myself@example.com");

    let Json(directory) = handlers::list_users(State(state.clone())).await.unwrap();
    assert_eq!(directory.data.len(), 2);

    let Json(one) = handlers::get_user(State(state), ApiPath(me.id)).await.unwrap();
    assert_eq!(one.data.name, "Myself");
}

#[test]
async fn test_get_unknown_user_is_not_found() {
    let (state, _repo) = create_test_state();

    let result = handlers::get_user(State(state), ApiPath(Uuid::new_v4())).await;

    let (status, body) = error_body(result.unwrap_err().into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.message, "User not found");
}

#[test]
async fn test_update_user_renames_owner() {
    let (state, repo) = create_test_state();
    let me = seed(&repo, "Before", Role::User).await;

    let Json(body) = handlers::update_user(
        me.clone(),
        State(state),
        ApiPath(me.id),
        ValidatedJson(UpdateUserRequest {
            name: Some("After Rename".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.message.as_deref(), Some("User updated successfully"));
    assert_eq!(body.data.name, "After Rename");
}

#[test]
async fn test_delete_user_cascades_through_handler() {
    let (state, repo) = create_test_state();
    let me = seed(&repo, "Departing", Role::User).await;
    let (_, Json(created)) = handlers::create_article(
        me.clone(),
        State(state.clone()),
        ValidatedJson(article_payload("Last Words Here", true)),
    )
    .await
    .unwrap();

    let Json(body) = handlers::delete_user(me.clone(), State(state.clone()), ApiPath(me.id))
        .await
        .unwrap();

    assert_eq!(body.message, "User account deleted successfully");
    assert!(repo.article_row(created.data.id).await.unwrap().deleted_at.is_some());
    let result = handlers::get_user_articles(State(state), ApiPath(me.id)).await;
    assert!(result.is_err());
}

#[test]
async fn test_my_articles_include_drafts() {
    let (state, repo) = create_test_state();
    let me = seed(&repo, "Prolific", Role::User).await;
    for (title, published) in [("Published Piece", true), ("Private Draft", false)] {
        handlers::create_article(
            me.clone(),
            State(state.clone()),
            ValidatedJson(article_payload(title, published)),
        )
        .await
        .unwrap();
    }

    let Json(mine) = handlers::get_my_articles(me.clone(), State(state.clone()))
        .await
        .unwrap();
    let Json(public) = handlers::get_user_articles(State(state), ApiPath(me.id))
        .await
        .unwrap();

    assert_eq!(mine.data.len(), 2);
    assert_eq!(public.data.len(), 1);
}

#[test]
async fn test_malformed_user_id_renders_error_envelope() {
    let (state, _repo) = create_test_state();

    let response = create_router(state)
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/users/not-a-uuid")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = error_body(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.success);
    assert!(body.message.contains("not-a-uuid"));
}
