use axum::{http::StatusCode, response::IntoResponse};
use chrono::Utc;
use quillpost::{
    AppError,
    auth::AuthError,
    error::ErrorBody,
    models::{
        ApiResponse, Article, ArticleDetail, ArticleSummary, CreateArticleRequest, RegisterRequest,
        Role, UpdateArticleRequest, UpdateUserRequest, User, UserProfile,
    },
};
use uuid::Uuid;
use validator::Validate;

// --- Test Utilities ---

fn sample_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role: Role::User,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn sample_article(author: &User) -> Article {
    let now = Utc::now();
    Article {
        id: Uuid::new_v4(),
        title: "Writing Rust services".to_string(),
        slug: "writing-rust-services".to_string(),
        image_url: "https://images.example.com/rust.png".to_string(),
        category: "Programming".to_string(),
        description: "How we structure our axum services.".to_string(),
        content: "Long form content ".repeat(5),
        published: false,
        author_id: author.id,
        author_name: author.name.clone(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn valid_article_request() -> CreateArticleRequest {
    CreateArticleRequest {
        title: "Hello World".to_string(),
        image_url: "https://images.example.com/cover.png".to_string(),
        category: "Technology".to_string(),
        description: "A description that is long enough.".to_string(),
        content: "Content ".repeat(10),
        published: false,
    }
}

async fn error_body(err: AppError) -> (StatusCode, ErrorBody) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- Redaction ---

#[test]
fn test_user_profile_never_carries_password_hash() {
    let user = sample_user();
    let json = serde_json::to_value(UserProfile::from(&user)).unwrap();

    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password_hash").is_none());
    assert!(!json.to_string().contains(&user.password_hash));
    assert_eq!(json["role"], "USER");
    assert!(json.get("createdAt").is_some(), "fields are camelCase");
}

#[test]
fn test_article_payloads_embed_author_id_and_name_only() {
    let author = sample_user();
    let article = sample_article(&author);

    let detail = serde_json::to_value(ArticleDetail::from(&article)).unwrap();
    assert_eq!(detail["author"]["name"], "Ada Lovelace");
    assert_eq!(detail["author"]["id"], author.id.to_string());
    assert!(detail["author"].get("email").is_none());
    assert_eq!(detail["imageUrl"], "https://images.example.com/rust.png");

    let summary = serde_json::to_value(ArticleSummary::from(&article)).unwrap();
    assert!(summary.get("content").is_none(), "listings omit the body");
}

#[test]
fn test_success_envelope_shape() {
    let with_message = serde_json::to_value(ApiResponse::with_message("Done", 1)).unwrap();
    assert_eq!(with_message, serde_json::json!({"success": true, "message": "Done", "data": 1}));

    let plain = serde_json::to_value(ApiResponse::ok(vec!["a"])).unwrap();
    assert_eq!(plain, serde_json::json!({"success": true, "data": ["a"]}));
}

// --- Validation rules ---

#[test]
fn test_valid_article_request_passes() {
    assert!(valid_article_request().validate().is_ok());
}

#[test]
fn test_article_field_rules() {
    let request = CreateArticleRequest {
        title: "Hey".to_string(),
        image_url: "not a url".to_string(),
        category: "ab".to_string(),
        description: "too short".to_string(),
        content: "tiny".to_string(),
        published: true,
    };

    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();
    for field in ["title", "image_url", "category", "description", "content"] {
        assert!(fields.contains_key(field), "{field} should be rejected");
    }
}

#[test]
fn test_published_defaults_to_draft() {
    let request: CreateArticleRequest = serde_json::from_value(serde_json::json!({
        "title": "Hello World",
        "imageUrl": "https://images.example.com/cover.png",
        "category": "Technology",
        "description": "A description that is long enough.",
        "content": "Content ".repeat(10),
    }))
    .unwrap();

    assert!(!request.published);
}

#[test]
fn test_partial_article_update_only_checks_present_fields() {
    let only_title = UpdateArticleRequest {
        title: Some("A brand new title".to_string()),
        ..Default::default()
    };
    assert!(only_title.validate().is_ok());

    let bad_description = UpdateArticleRequest {
        description: Some("short".to_string()),
        ..Default::default()
    };
    assert!(bad_description.validate().is_err());
}

#[test]
fn test_slug_cannot_be_set_by_clients() {
    let request: UpdateArticleRequest =
        serde_json::from_value(serde_json::json!({ "slug": "my-custom-slug" })).unwrap();

    let errors = request.validate().unwrap_err();
    let slug_errors = errors.field_errors()["slug"];
    assert_eq!(
        slug_errors[0].message.as_deref(),
        Some("Slug cannot be set manually")
    );
}

#[test]
fn test_register_rules() {
    let ok = RegisterRequest {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "password123".to_string(),
    };
    assert!(ok.validate().is_ok());

    let bad = RegisterRequest {
        name: "Al".to_string(),
        email: "not-an-email".to_string(),
        password: "short".to_string(),
    };
    let errors = bad.validate().unwrap_err();
    assert_eq!(errors.field_errors().len(), 3);
}

#[test]
fn test_update_user_accepts_camel_case_current_password() {
    let request: UpdateUserRequest = serde_json::from_value(serde_json::json!({
        "password": "new-password-1",
        "currentPassword": "old-password-1"
    }))
    .unwrap();

    assert_eq!(request.current_password.as_deref(), Some("old-password-1"));
    assert!(request.validate().is_ok());
}

// --- Error envelope ---

#[tokio::test]
async fn test_validation_error_lists_fields_in_camel_case() {
    let request = CreateArticleRequest {
        image_url: "nope".to_string(),
        ..valid_article_request()
    };
    let err = AppError::from(request.validate().unwrap_err());

    let (status, body) = error_body(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.success);
    assert_eq!(body.message, "Validation error");
    let errors = body.errors.expect("per-field errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "imageUrl");
    assert_eq!(errors[0].message, "Invalid image URL");
}

#[tokio::test]
async fn test_error_statuses() {
    let cases = [
        (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
        (AppError::Auth(AuthError::MissingToken), StatusCode::UNAUTHORIZED),
        (AppError::Auth(AuthError::TokenExpired), StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        (AppError::not_found("Article"), StatusCode::NOT_FOUND),
        (AppError::EmailAlreadyRegistered, StatusCode::CONFLICT),
        (AppError::EmailInUse, StatusCode::CONFLICT),
        (AppError::CurrentPasswordRequired, StatusCode::BAD_REQUEST),
        (AppError::CurrentPasswordIncorrect, StatusCode::BAD_REQUEST),
    ];

    for (err, expected) in cases {
        let message = err.to_string();
        let (status, body) = error_body(err).await;
        assert_eq!(status, expected);
        assert_eq!(body.message, message);
        assert!(body.errors.is_none());
        assert!(body.detail.is_none());
    }
}

#[tokio::test]
async fn test_server_errors_hide_internals() {
    let (status, body) = error_body(AppError::Internal("pool exhausted".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.message, "Internal Server Error");
    assert!(!body.message.contains("pool exhausted"));
}

#[test]
fn test_row_not_found_maps_to_not_found() {
    let err = AppError::from(sqlx::Error::RowNotFound);
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}
