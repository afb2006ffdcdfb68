use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use quillpost::{
    AppError, AppState, InMemoryRepository,
    auth::{AuthError, AuthUser, Claims, TokenService, bearer_token, hash_password, verify_password},
    config::AppConfig,
    models::{NewUser, Role, User},
    repository::Repository,
};
use std::sync::Arc;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "auth-integration-test-secret";

// --- Test Utilities ---

fn create_app_state(repo: Arc<InMemoryRepository>) -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(repo, config)
}

async fn seed_user(repo: &InMemoryRepository, email: &str, role: Role) -> User {
    repo.create_user(NewUser {
        name: "Token Holder".to_string(),
        email: email.to_string(),
        password_hash: "unused-in-these-tests".to_string(),
        role,
    })
    .await
    .unwrap()
}

/// Signs arbitrary claims with the test secret, bypassing `TokenService`.
fn create_token(user_id: Uuid, role: Role, exp_offset: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: "forged@example.com".to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + exp_offset).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn get_request_parts(token: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/api/me".parse::<Uri>().unwrap());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

fn auth_error(result: Result<AuthUser, AppError>) -> AuthError {
    match result {
        Err(AppError::Auth(e)) => e,
        other => panic!("expected an authentication error, got {other:?}"),
    }
}

// --- TokenService ---

#[test]
fn test_issued_token_round_trips_identity() {
    let tokens = TokenService::new(TEST_JWT_SECRET, Duration::hours(24));
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        password_hash: String::new(),
        role: Role::Admin,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let claims = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();

    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, "grace@example.com");
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 24 * 3600);
}

#[test]
fn test_hand_built_config_with_absurd_lifetime_falls_back_to_default() {
    let tokens = TokenService::from_config(&AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiry_hours: i64::MAX,
        ..AppConfig::default()
    });
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: "Lifetime".to_string(),
        email: "lifetime@example.com".to_string(),
        password_hash: String::new(),
        role: Role::User,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let claims = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();

    assert_eq!(claims.exp - claims.iat, 24 * 3600);
}

#[test]
fn test_expired_token_is_reported_as_expired() {
    let tokens = TokenService::new(TEST_JWT_SECRET, Duration::hours(24));
    let token = create_token(Uuid::new_v4(), Role::User, Duration::hours(-2));

    assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::TokenExpired);
}

#[test]
fn test_foreign_signature_and_garbage_are_invalid() {
    let tokens = TokenService::new("a-different-secret", Duration::hours(24));
    let token = create_token(Uuid::new_v4(), Role::User, Duration::hours(1));

    assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::TokenInvalid);
    assert_eq!(tokens.verify("not.a.jwt").unwrap_err(), AuthError::TokenInvalid);
}

#[test]
fn test_bearer_prefix_is_required() {
    let mut headers = axum::http::HeaderMap::new();
    assert_eq!(bearer_token(&headers).unwrap_err(), AuthError::MissingToken);

    headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
    assert_eq!(bearer_token(&headers).unwrap_err(), AuthError::MissingToken);

    headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
    assert_eq!(bearer_token(&headers).unwrap(), "abc");
}

// --- Password hashing ---

#[test]
fn test_password_hash_is_salted_and_verifiable() {
    let first = hash_password("correct horse").unwrap();
    let second = hash_password("correct horse").unwrap();

    assert_ne!(first, second, "each hash uses a fresh salt");
    assert!(first.starts_with("$argon2"));
    assert!(verify_password("correct horse", &first).unwrap());
    assert!(!verify_password("wrong horse", &first).unwrap());
}

// --- AuthUser extractor ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = seed_user(&repo, "member@example.com", Role::User).await;
    let state = create_app_state(repo);
    let token = state.tokens.issue(&user).unwrap();

    let mut parts = get_request_parts(Some(&token));
    let principal = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(principal.id, user.id);
    assert_eq!(principal.email, "member@example.com");
    // The resolved principal is cached for later extractors.
    assert_eq!(parts.extensions.get::<AuthUser>(), Some(&principal));
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state(Arc::new(InMemoryRepository::new()));

    let mut parts = get_request_parts(None);
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(auth_error(result), AuthError::MissingToken);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = seed_user(&repo, "late@example.com", Role::User).await;
    let state = create_app_state(repo);
    let token = create_token(user.id, Role::User, Duration::hours(-1));

    let mut parts = get_request_parts(Some(&token));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    let err = auth_error(result);
    assert_eq!(err, AuthError::TokenExpired);
    assert_eq!(AppError::from(err).status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stale_token_of_deleted_account_is_rejected() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = seed_user(&repo, "gone@example.com", Role::User).await;
    let state = create_app_state(repo.clone());
    let token = state.tokens.issue(&user).unwrap();

    assert!(repo.soft_delete_user(user.id).await.unwrap());

    let mut parts = get_request_parts(Some(&token));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(auth_error(result), AuthError::UserNotFound);
}

#[tokio::test]
async fn test_principal_carries_stored_role_not_token_role() {
    let repo = Arc::new(InMemoryRepository::new());
    let user = seed_user(&repo, "plain@example.com", Role::User).await;
    let state = create_app_state(repo);
    // Genuinely signed, but claims a role the account does not have.
    let token = create_token(user.id, Role::Admin, Duration::hours(1));

    let mut parts = get_request_parts(Some(&token));
    let principal = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(principal.role, Role::User);
    assert!(!principal.is_admin());
}
