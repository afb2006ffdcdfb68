use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Article, ArticleChanges, NewArticle, NewUser, User, UserChanges, UserSummary},
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// Persistence contract for users and articles. Services only ever talk to this trait,
/// so the Postgres store and the in-memory store are interchangeable.
///
/// Every read skips soft-deleted rows unless the method says otherwise. Unique
/// violations (active email, active slug) surface as `AppError::Conflict`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_active_user(&self, id: Uuid) -> AppResult<Option<User>>;
    // Case-insensitive on email.
    async fn find_active_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    // Whether another active account holds `email`.
    async fn email_in_use(&self, email: &str, excluding: Option<Uuid>) -> AppResult<bool>;
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    // Newest first, with published article counts.
    async fn list_active_users(&self) -> AppResult<Vec<UserSummary>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>>;

    /// Soft-deletes the user and every active article they wrote as one atomic unit.
    /// `false` when no active user has that id.
    async fn soft_delete_user(&self, id: Uuid) -> AppResult<bool>;

    // --- Published reads (anonymous audience) ---
    async fn list_published_articles(&self) -> AppResult<Vec<Article>>;
    // Substring match over title, description, content and author name.
    async fn search_published_articles(&self, query: &str) -> AppResult<Vec<Article>>;
    async fn list_published_by_category(&self, category: &str) -> AppResult<Vec<Article>>;
    async fn list_published_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>>;
    async fn find_published_by_slug(&self, slug: &str) -> AppResult<Option<Article>>;

    // --- Author and admin reads (drafts included) ---
    async fn list_articles_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>>;
    // Ordered by last update, newest first.
    async fn list_active_articles(&self) -> AppResult<Vec<Article>>;
    async fn find_active_article(&self, id: Uuid) -> AppResult<Option<Article>>;

    // --- Article writes ---
    async fn slug_in_use(&self, slug: &str, excluding: Option<Uuid>) -> AppResult<bool>;
    async fn create_article(&self, article: NewArticle) -> AppResult<Article>;
    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> AppResult<Option<Article>>;
    async fn soft_delete_article(&self, id: Uuid) -> AppResult<bool>;
}

/// RepositoryState
///
/// Shared handle to the persistence layer held in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
