use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, DEFAULT_JWT_EXPIRY_HOURS, JWT_EXPIRY_RANGE},
    error::{AppError, AppResult},
    models::{Role, User},
    repository::RepositoryState,
};

/// AuthError
///
/// Authentication failures. All of them surface as 401; the messages are what the
/// client sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication token required")]
    MissingToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    /// The token is genuine but its account is gone or soft-deleted.
    #[error("Invalid token or user does not exist")]
    UserNotFound,

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Claims
///
/// Payload signed into every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub email: String,
    /// Role at issue time. Authorization uses the role re-read from the store instead.
    pub role: Role,
    /// Issued At (iat), unix seconds.
    pub iat: i64,
    /// Expiration Time (exp), unix seconds.
    pub exp: i64,
}

/// TokenService
///
/// Signs and verifies HS256 bearer tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiration is always enforced.
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// from_config
    ///
    /// An out-of-range lifetime (only reachable by building `AppConfig` by hand, since
    /// `AppConfig::load` rejects it) falls back to the default.
    pub fn from_config(config: &AppConfig) -> Self {
        let ttl = Some(config.jwt_expiry_hours)
            .filter(|hours| JWT_EXPIRY_RANGE.contains(hours))
            .and_then(Duration::try_hours)
            .unwrap_or_else(|| {
                tracing::warn!(
                    hours = config.jwt_expiry_hours,
                    "token lifetime out of range, using default"
                );
                Duration::hours(DEFAULT_JWT_EXPIRY_HOURS)
            });
        Self::new(&config.jwt_secret, ttl)
    }

    /// issue
    ///
    /// Produces a signed token for `user` valid for the configured lifetime.
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry overflows".to_string()))?;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// verify
    ///
    /// Checks signature and expiry. Says nothing about whether the account still
    /// exists; the `AuthUser` extractor does that lookup.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }
}

// --- Password hashing ---

/// hash_password
///
/// Argon2id with a fresh random salt, encoded as a PHC string.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// verify_password
///
/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// --- Principal ---

/// AuthUser
///
/// The resolved identity of an authenticated request, read fresh from the store so a
/// role change or account deletion takes effect immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// bearer_token
///
/// Pulls `<token>` out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses a principal already resolved earlier in the request (the auth middleware
///    runs this extractor first and leaves the result in the request extensions).
/// 2. Extracts and verifies the bearer token.
/// 3. Re-fetches the user so stale tokens of deleted accounts are rejected.
///
/// Rejection: `AppError::Auth(..)`, rendered as 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<AuthUser>() {
            return Ok(principal.clone());
        }

        let tokens = TokenService::from_ref(state);
        let claims = bearer_token(&parts.headers)
            .and_then(|token| tokens.verify(token))
            .inspect_err(|e| tracing::warn!(error = %e, "rejected bearer token"))?;

        let repo = RepositoryState::from_ref(state);
        let user = repo
            .find_active_user(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let principal = AuthUser::from(&user);
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}
