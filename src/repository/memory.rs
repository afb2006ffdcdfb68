use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{Article, ArticleChanges, NewArticle, NewUser, User, UserChanges, UserSummary},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    articles: Vec<Article>,
}

impl Tables {
    fn active_user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id && u.is_active())
    }

    fn email_taken(&self, email: &str, excluding: Option<Uuid>) -> bool {
        self.users.iter().any(|u| {
            u.is_active() && u.email.eq_ignore_ascii_case(email) && Some(u.id) != excluding
        })
    }

    fn slug_taken(&self, slug: &str, excluding: Option<Uuid>) -> bool {
        self.articles
            .iter()
            .any(|a| a.is_active() && a.slug == slug && Some(a.id) != excluding)
    }

    /// Copy of the article with the author's current display name.
    fn hydrate(&self, article: &Article) -> Article {
        let mut article = article.clone();
        if let Some(author) = self.users.iter().find(|u| u.id == article.author_id) {
            article.author_name = author.name.clone();
        }
        article
    }

    /// Matching articles, newest first. Later inserts win timestamp ties.
    fn select(&self, keep: impl Fn(&Article) -> bool) -> Vec<Article> {
        let mut rows: Vec<Article> = self
            .articles
            .iter()
            .rev()
            .map(|a| self.hydrate(a))
            .filter(|a| keep(a))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

/// InMemoryRepository
///
/// `Repository` held entirely in process memory. Mirrors the Postgres semantics the
/// services rely on: soft deletes, partial unique indexes on active email and slug,
/// and the all-or-nothing account cascade. Test support only: the binary always runs
/// on `PostgresRepository`, and `fail_next_cascade` exists purely for failure tests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    fail_next_cascade: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `soft_delete_user` fail after its article changes were staged but
    /// before anything is committed.
    pub fn fail_next_cascade(&self) {
        self.fail_next_cascade.store(true, Ordering::SeqCst);
    }

    /// Raw row lookup that ignores soft deletes, for asserting on tombstones.
    pub async fn user_row(&self, id: Uuid) -> Option<User> {
        self.tables.read().await.users.iter().find(|u| u.id == id).cloned()
    }

    /// Raw row lookup that ignores soft deletes, for asserting on tombstones.
    pub async fn article_row(&self, id: Uuid) -> Option<Article> {
        let tables = self.tables.read().await;
        tables
            .articles
            .iter()
            .find(|a| a.id == id)
            .map(|a| tables.hydrate(a))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_active_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.active_user(id).cloned())
    }

    async fn find_active_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.is_active() && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_in_use(&self, email: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        Ok(self.tables.read().await.email_taken(email, excluding))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn list_active_users(&self) -> AppResult<Vec<UserSummary>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<UserSummary> = tables
            .users
            .iter()
            .rev()
            .filter(|u| u.is_active())
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                role: u.role,
                created_at: u.created_at,
                updated_at: u.updated_at,
                article_count: tables
                    .articles
                    .iter()
                    .filter(|a| a.author_id == u.id && a.is_public())
                    .count() as i64,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id && u.is_active()) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    /// soft_delete_user
    ///
    /// Works on a staged copy of the tables and swaps it in under the same write lock,
    /// so a failure part-way leaves the stored state untouched.
    async fn soft_delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.active_user(id).is_none() {
            return Ok(false);
        }

        let now = Utc::now();
        let mut staged = (*tables).clone();
        for article in staged
            .articles
            .iter_mut()
            .filter(|a| a.author_id == id && a.is_active())
        {
            article.deleted_at = Some(now);
        }

        if self.fail_next_cascade.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal(
                "account cascade aborted before commit".to_string(),
            ));
        }

        if let Some(user) = staged.users.iter_mut().find(|u| u.id == id) {
            user.deleted_at = Some(now);
            user.updated_at = now;
        }

        *tables = staged;
        Ok(true)
    }

    async fn list_published_articles(&self) -> AppResult<Vec<Article>> {
        Ok(self.tables.read().await.select(Article::is_public))
    }

    async fn search_published_articles(&self, query: &str) -> AppResult<Vec<Article>> {
        let needle = query.to_lowercase();
        Ok(self.tables.read().await.select(|a| {
            a.is_public()
                && [&a.title, &a.author_name, &a.description, &a.content]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        }))
    }

    async fn list_published_by_category(&self, category: &str) -> AppResult<Vec<Article>> {
        Ok(self
            .tables
            .read()
            .await
            .select(|a| a.is_public() && a.category.to_lowercase() == category.to_lowercase()))
    }

    async fn list_published_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>> {
        Ok(self
            .tables
            .read()
            .await
            .select(|a| a.is_public() && a.author_id == author_id))
    }

    async fn find_published_by_slug(&self, slug: &str) -> AppResult<Option<Article>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .find(|a| a.is_public() && a.slug == slug)
            .map(|a| tables.hydrate(a)))
    }

    async fn list_articles_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>> {
        Ok(self
            .tables
            .read()
            .await
            .select(|a| a.is_active() && a.author_id == author_id))
    }

    async fn list_active_articles(&self) -> AppResult<Vec<Article>> {
        let mut rows = self.tables.read().await.select(Article::is_active);
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn find_active_article(&self, id: Uuid) -> AppResult<Option<Article>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .find(|a| a.id == id && a.is_active())
            .map(|a| tables.hydrate(a)))
    }

    async fn slug_in_use(&self, slug: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        Ok(self.tables.read().await.slug_taken(slug, excluding))
    }

    async fn create_article(&self, article: NewArticle) -> AppResult<Article> {
        let mut tables = self.tables.write().await;
        if tables.active_user(article.author_id).is_none() {
            return Err(AppError::BadRequest(
                "Referenced record does not exist".to_string(),
            ));
        }
        if tables.slug_taken(&article.slug, None) {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }

        let now = Utc::now();
        let row = Article {
            id: Uuid::new_v4(),
            title: article.title,
            slug: article.slug,
            image_url: article.image_url,
            category: article.category,
            description: article.description,
            content: article.content,
            published: article.published,
            author_id: article.author_id,
            author_name: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let hydrated = tables.hydrate(&row);
        tables.articles.push(row);
        Ok(hydrated)
    }

    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> AppResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &changes.slug {
            if tables.slug_taken(slug, Some(id)) {
                return Err(AppError::Conflict("Slug already exists".to_string()));
            }
        }

        let Some(article) = tables
            .articles
            .iter_mut()
            .find(|a| a.id == id && a.is_active())
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(slug) = changes.slug {
            article.slug = slug;
        }
        if let Some(image_url) = changes.image_url {
            article.image_url = image_url;
        }
        if let Some(category) = changes.category {
            article.category = category;
        }
        if let Some(description) = changes.description {
            article.description = description;
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        if let Some(published) = changes.published {
            article.published = published;
        }
        article.updated_at = Utc::now();

        let updated = article.clone();
        Ok(Some(tables.hydrate(&updated)))
    }

    async fn soft_delete_article(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .articles
            .iter_mut()
            .find(|a| a.id == id && a.is_active())
        {
            Some(article) => {
                article.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
