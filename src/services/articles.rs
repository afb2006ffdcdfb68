use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        Article, ArticleChanges, ArticleDetail, ArticleSummary, CreateArticleRequest, NewArticle,
        UpdateArticleRequest,
    },
    policy::{self, Action},
    repository::Repository,
    slug,
};

fn summaries(articles: &[Article]) -> Vec<ArticleSummary> {
    articles.iter().map(ArticleSummary::from).collect()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

async fn active_article(repo: &dyn Repository, id: Uuid) -> AppResult<Article> {
    repo.find_active_article(id)
        .await?
        .ok_or_else(|| AppError::not_found("Article"))
}

/// unique_slug
///
/// Slug for `title` that no other active article uses. A collision gets one
/// millisecond-timestamp suffix; should that collide too, the unique index turns the
/// write into a `Conflict`.
pub async fn unique_slug(
    repo: &dyn Repository,
    title: &str,
    excluding: Option<Uuid>,
) -> AppResult<String> {
    let base = slug::base_slug(title);
    if repo.slug_in_use(&base, excluding).await? {
        Ok(slug::disambiguate(&base, Utc::now()))
    } else {
        Ok(base)
    }
}

// --- Public reads ---

pub async fn list_published(repo: &dyn Repository) -> AppResult<Vec<ArticleSummary>> {
    Ok(summaries(&repo.list_published_articles().await?))
}

/// search
///
/// Case-insensitive substring search over published articles.
///
/// # Errors
/// `BadRequest` for a blank query.
pub async fn search(repo: &dyn Repository, query: &str) -> AppResult<Vec<ArticleSummary>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }
    Ok(summaries(&repo.search_published_articles(query).await?))
}

pub async fn by_category(repo: &dyn Repository, category: &str) -> AppResult<Vec<ArticleSummary>> {
    Ok(summaries(
        &repo.list_published_by_category(category.trim()).await?,
    ))
}

pub async fn by_slug(repo: &dyn Repository, slug: &str) -> AppResult<ArticleDetail> {
    repo.find_published_by_slug(slug)
        .await?
        .map(|article| ArticleDetail::from(&article))
        .ok_or_else(|| AppError::not_found("Article"))
}

/// by_author
///
/// Published articles of an active user. A missing or deleted user is `NotFound`
/// rather than an empty list.
pub async fn by_author(repo: &dyn Repository, author_id: Uuid) -> AppResult<Vec<ArticleSummary>> {
    if repo.find_active_user(author_id).await?.is_none() {
        return Err(AppError::not_found("User"));
    }
    Ok(summaries(&repo.list_published_by_author(author_id).await?))
}

// --- Author reads ---

/// list_own
///
/// Every active article of the principal, drafts included.
pub async fn list_own(repo: &dyn Repository, principal: &AuthUser) -> AppResult<Vec<ArticleSummary>> {
    Ok(summaries(&repo.list_articles_by_author(principal.id).await?))
}

// --- Admin reads ---

pub async fn admin_list(repo: &dyn Repository, principal: &AuthUser) -> AppResult<Vec<ArticleSummary>> {
    policy::require_admin(principal)?;
    Ok(summaries(&repo.list_active_articles().await?))
}

pub async fn admin_get(repo: &dyn Repository, principal: &AuthUser, id: Uuid) -> AppResult<ArticleDetail> {
    policy::require_admin(principal)?;
    let article = active_article(repo, id).await?;
    Ok(ArticleDetail::from(&article))
}

// --- Mutations ---

/// create
///
/// The principal becomes the author; the slug is derived from the title.
pub async fn create(
    repo: &dyn Repository,
    principal: &AuthUser,
    input: CreateArticleRequest,
) -> AppResult<ArticleDetail> {
    let title = input.title.trim().to_string();
    let slug = unique_slug(repo, &title, None).await?;

    let article = repo
        .create_article(NewArticle {
            title,
            slug,
            image_url: input.image_url.trim().to_string(),
            category: input.category.trim().to_string(),
            description: input.description.trim().to_string(),
            content: input.content.trim().to_string(),
            published: input.published,
            author_id: principal.id,
        })
        .await?;

    tracing::info!(article_id = %article.id, slug = %article.slug, author = %principal.id, "article created");
    Ok(ArticleDetail::from(&article))
}

/// update
///
/// Author-only partial update. The slug is regenerated only when the title actually
/// changes; an unchanged title keeps the stored slug.
pub async fn update(
    repo: &dyn Repository,
    principal: &AuthUser,
    id: Uuid,
    input: UpdateArticleRequest,
) -> AppResult<ArticleDetail> {
    let current = active_article(repo, id).await?;
    policy::authorize(principal, current.author_id, Action::UpdateArticle)?;

    let title = trimmed(input.title);
    let slug = match title.as_deref() {
        Some(title) if title != current.title => Some(unique_slug(repo, title, Some(id)).await?),
        _ => None,
    };

    let changes = ArticleChanges {
        title,
        slug,
        image_url: trimmed(input.image_url),
        category: trimmed(input.category),
        description: trimmed(input.description),
        content: trimmed(input.content),
        published: input.published,
    };

    let updated = repo
        .update_article(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Article"))?;

    tracing::info!(article_id = %updated.id, "article updated");
    Ok(ArticleDetail::from(&updated))
}

/// toggle_publish
///
/// Flips Draft and Published. Author-only.
pub async fn toggle_publish(
    repo: &dyn Repository,
    principal: &AuthUser,
    id: Uuid,
) -> AppResult<ArticleDetail> {
    let current = active_article(repo, id).await?;
    policy::authorize(principal, current.author_id, Action::PublishArticle)?;

    let changes = ArticleChanges {
        published: Some(!current.published),
        ..ArticleChanges::default()
    };
    let updated = repo
        .update_article(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Article"))?;

    tracing::info!(article_id = %updated.id, published = updated.published, "publish state toggled");
    Ok(ArticleDetail::from(&updated))
}

/// delete
///
/// Soft delete by the author or an admin. Deletion is terminal.
pub async fn delete(repo: &dyn Repository, principal: &AuthUser, id: Uuid) -> AppResult<()> {
    let current = active_article(repo, id).await?;
    policy::authorize(principal, current.author_id, Action::DeleteArticle)?;

    if !repo.soft_delete_article(id).await? {
        return Err(AppError::not_found("Article"));
    }

    tracing::info!(article_id = %id, by = %principal.id, "article deleted");
    Ok(())
}
