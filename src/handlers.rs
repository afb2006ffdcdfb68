use crate::{
    AppState,
    auth::AuthUser,
    error::{AppResult, ErrorBody},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    models::{
        ApiResponse, ArticleDetail, ArticleSummary, AuthPayload, CreateArticleRequest,
        LoginRequest, MessageResponse, RegisterRequest, UpdateArticleRequest, UpdateUserRequest,
        UserProfile, UserSummary,
    },
    services::{articles, auth, users},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// SearchParams
///
/// Query string of `GET /api/articles/search`. A missing or blank `q` is rejected by
/// the service with 400.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    /// Case-insensitive substring matched against title, author name, description and content.
    pub q: Option<String>,
}

// --- Auth ---

/// register
///
/// [Public Route] Creates a `USER` account and returns it together with a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthPayload>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let session = auth::register(state.repo.as_ref(), &state.tokens, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User created successfully", session)),
    ))
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token.
///
/// *Note*: unknown email and wrong password produce the same 401 body.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthPayload>),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let session = auth::login(state.repo.as_ref(), &state.tokens, payload).await?;
    Ok(Json(ApiResponse::with_message("Login successful", session)))
}

// --- Users ---

/// get_me
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_me(
    principal: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = users::me(state.repo.as_ref(), &principal).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// list_users
///
/// [Public Route] Active users, newest first, with their published article counts.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Users", body = ApiResponse<Vec<UserSummary>>))
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let list = users::list_users(state.repo.as_ref()).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// get_user
///
/// [Public Route] One active user, redacted.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserProfile>),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = users::get_user(state.repo.as_ref(), id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// update_user
///
/// [Authenticated Route] Partial profile update of the caller's own account.
///
/// *Authorization*: owner only, admins included. Changing the password requires
/// `currentPassword`.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid input or password re-verification failed", body = ErrorBody),
        (status = 403, description = "Not the profile owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_user(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = users::update_profile(state.repo.as_ref(), &principal, id, payload).await?;
    Ok(Json(ApiResponse::with_message("User updated successfully", profile)))
}

/// delete_user
///
/// [Authenticated Route] Soft-deletes the caller's account and all of its articles.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Not the account owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_user(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    users::delete_account(state.repo.as_ref(), &principal, id).await?;
    Ok(Json(MessageResponse::new("User account deleted successfully")))
}

/// get_user_articles
///
/// [Public Route] Published articles written by one active user.
#[utoipa::path(
    get,
    path = "/api/users/{id}/articles",
    params(("id" = Uuid, Path, description = "Author id")),
    responses(
        (status = 200, description = "Articles", body = ApiResponse<Vec<ArticleSummary>>),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user_articles(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let list = articles::by_author(state.repo.as_ref(), id).await?;
    Ok(Json(ApiResponse::ok(list)))
}

// --- Articles: public reads ---

/// list_articles
///
/// [Public Route] Published articles, newest first. Drafts and deleted articles never
/// appear here.
#[utoipa::path(
    get,
    path = "/api/articles",
    responses((status = 200, description = "Published articles", body = ApiResponse<Vec<ArticleSummary>>))
)]
pub async fn list_articles(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let list = articles::list_published(state.repo.as_ref()).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// search_articles
///
/// [Public Route] Substring search over published articles.
#[utoipa::path(
    get,
    path = "/api/articles/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching articles", body = ApiResponse<Vec<ArticleSummary>>),
        (status = 400, description = "Missing search query", body = ErrorBody)
    )
)]
pub async fn search_articles(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let query = params.q.unwrap_or_default();
    let list = articles::search(state.repo.as_ref(), &query).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// articles_by_category
///
/// [Public Route] Published articles whose category matches, ignoring case.
#[utoipa::path(
    get,
    path = "/api/articles/category/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses((status = 200, description = "Articles in category", body = ApiResponse<Vec<ArticleSummary>>))
)]
pub async fn articles_by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let list = articles::by_category(state.repo.as_ref(), &category).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// get_article
///
/// [Public Route] One published article by slug.
///
/// *Note*: shares its path with the id-addressed mutations; the segment is a slug here.
#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = ApiResponse<ArticleDetail>),
        (status = 404, description = "Article not found", body = ErrorBody)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let article = articles::by_slug(state.repo.as_ref(), &slug).await?;
    Ok(Json(ApiResponse::ok(article)))
}

// --- Articles: author ---

/// get_my_articles
///
/// [Authenticated Route] The caller's active articles, drafts included.
#[utoipa::path(
    get,
    path = "/api/me/articles",
    responses((status = 200, description = "My articles", body = ApiResponse<Vec<ArticleSummary>>)),
    security(("bearer" = []))
)]
pub async fn get_my_articles(
    principal: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let list = articles::list_own(state.repo.as_ref(), &principal).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// create_article
///
/// [Authenticated Route] Creates an article authored by the caller. Saved as a draft
/// unless `published` is true.
#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ApiResponse<ArticleDetail>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Slug collision", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_article(
    principal: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateArticleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ArticleDetail>>)> {
    let article = articles::create(state.repo.as_ref(), &principal, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Article created successfully", article)),
    ))
}

/// update_article
///
/// [Authenticated Route] Partial update; serves both PUT and PATCH.
///
/// *Authorization*: author only. The slug follows a changed title.
#[utoipa::path(
    patch,
    path = "/api/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ApiResponse<ArticleDetail>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_article(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateArticleRequest>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let article = articles::update(state.repo.as_ref(), &principal, id, payload).await?;
    Ok(Json(ApiResponse::with_message("Article updated successfully", article)))
}

/// toggle_publish
///
/// [Authenticated Route] Flips an article between draft and published.
#[utoipa::path(
    patch,
    path = "/api/articles/{id}/publish",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 200, description = "Publish state toggled", body = ApiResponse<ArticleDetail>),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn toggle_publish(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let article = articles::toggle_publish(state.repo.as_ref(), &principal, id).await?;
    let message = if article.published {
        "Article published successfully"
    } else {
        "Article unpublished successfully"
    };
    Ok(Json(ApiResponse::with_message(message, article)))
}

/// delete_article
///
/// [Authenticated Route] Soft-deletes an article.
///
/// *Authorization*: the author, or any admin.
#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 403, description = "Neither author nor admin", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_article(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    articles::delete(state.repo.as_ref(), &principal, id).await?;
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}

// --- Articles: admin ---

/// admin_list_articles
///
/// [Admin Route] Every active article including drafts, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/articles/admin/all",
    responses(
        (status = 200, description = "All active articles", body = ApiResponse<Vec<ArticleSummary>>),
        (status = 403, description = "Not an admin", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn admin_list_articles(
    principal: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ArticleSummary>>>> {
    let list = articles::admin_list(state.repo.as_ref(), &principal).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// admin_get_article
///
/// [Admin Route] One active article by id, drafts included.
#[utoipa::path(
    get,
    path = "/api/articles/admin/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ApiResponse<ArticleDetail>),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn admin_get_article(
    principal: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let article = articles::admin_get(state.repo.as_ref(), &principal, id).await?;
    Ok(Json(ApiResponse::ok(article)))
}
