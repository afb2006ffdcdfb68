use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Core Records (Mapped to Database) ---

/// Role
///
/// The RBAC field stored in the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User
///
/// Canonical row of the `users` table. Carries the password hash, so it is never
/// serialized: every outbound shape goes through `UserProfile` or `UserSummary`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Stored trimmed and lowercased.
    pub email: String,
    // Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Soft-delete marker. `Some` rows are invisible to every normal read.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// NewUser
///
/// Insert payload for the credential store. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// UserChanges
///
/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Article
///
/// Row of the `articles` table joined with the author's display name.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub image_url: String,
    pub category: String,
    pub description: String,
    pub content: String,
    // Draft (false) or Published (true).
    pub published: bool,
    // FK to users.id (the author of record).
    pub author_id: Uuid,
    // Loaded via JOIN in the repository query.
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Visible to anonymous readers: published and not soft-deleted.
    pub fn is_public(&self) -> bool {
        self.published && self.is_active()
    }
}

/// NewArticle
///
/// Insert payload. The slug has already been made unique by the service layer.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub image_url: String,
    pub category: String,
    pub description: String,
    pub content: String,
    pub published: bool,
    pub author_id: Uuid,
}

/// ArticleChanges
///
/// Partial article update. `slug` is only set when the title changed.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    pub password: String,
}

/// LoginRequest
///
/// Input payload for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// UpdateUserRequest
///
/// Partial profile update (`PATCH /api/users/{id}`). A new `password` is only accepted
/// together with the caller's `currentPassword`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    #[ts(optional)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email address"))]
    #[ts(optional)]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"))]
    #[ts(optional)]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub current_password: Option<String>,
}

/// CreateArticleRequest
///
/// Input payload for `POST /api/articles`. Slug, id and author are server-assigned.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateArticleRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: String,
    #[validate(length(min = 3, message = "Category must be at least 3 characters"))]
    pub category: String,
    #[validate(length(min = 20, max = 500, message = "Description must be between 20 and 500 characters"))]
    pub description: String,
    #[validate(length(min = 50, message = "Content must be at least 50 characters"))]
    pub content: String,
    /// Publish immediately instead of saving a draft.
    #[serde(default)]
    pub published: bool,
}

/// UpdateArticleRequest
///
/// Partial update payload for `PUT`/`PATCH /api/articles/{id}`. Only the fields that
/// are present are validated and written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    #[ts(optional)]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Invalid image URL"))]
    #[ts(optional)]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, message = "Category must be at least 3 characters"))]
    #[ts(optional)]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 20, max = 500, message = "Description must be between 20 and 500 characters"))]
    #[ts(optional)]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 50, message = "Content must be at least 50 characters"))]
    #[ts(optional)]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub published: Option<bool>,

    /// Slugs follow the title; sending one is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "reject_manual_slug"))]
    #[ts(skip)]
    pub slug: Option<String>,
}

fn reject_manual_slug(_slug: &str) -> Result<(), ValidationError> {
    Err(ValidationError::new("slug_read_only")
        .with_message(Cow::Borrowed("Slug cannot be set manually")))
}

// --- Response Shapes (Output Schemas) ---

/// UserProfile
///
/// Redacted user record: the allow-list of user fields that may leave the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// UserSummary
///
/// Entry of the public user listing: the redacted profile plus the number of the
/// user's published, non-deleted articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "number")]
    pub article_count: i64,
}

/// AuthorRef
///
/// Minimal author info embedded in article payloads. The email stays private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
}

/// ArticleSummary
///
/// Listing shape (no body content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub image_url: String,
    pub category: String,
    pub description: String,
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub author: AuthorRef,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            image_url: article.image_url.clone(),
            category: article.category.clone(),
            description: article.description.clone(),
            published: article.published,
            created_at: article.created_at,
            updated_at: article.updated_at,
            author: AuthorRef {
                id: article.author_id,
                name: article.author_name.clone(),
            },
        }
    }
}

/// ArticleDetail
///
/// Full article shape, used for the detail page, the edit form and mutation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleDetail {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub image_url: String,
    pub category: String,
    pub description: String,
    pub content: String,
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub author: AuthorRef,
}

impl From<&Article> for ArticleDetail {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            image_url: article.image_url.clone(),
            category: article.category.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            published: article.published,
            created_at: article.created_at,
            updated_at: article.updated_at,
            author: AuthorRef {
                id: article.author_id,
                name: article.author_name.clone(),
            },
        }
    }
}

/// AuthPayload
///
/// Result of registration and login: a signed bearer token and the redacted user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthPayload {
    pub user: UserProfile,
    pub token: String,
}

// --- Envelopes ---

/// ApiResponse
///
/// Success envelope: `{ success: true, message?, data }`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// MessageResponse
///
/// Success envelope for operations without a payload (deletions).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
