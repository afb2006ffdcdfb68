use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::AppResult,
    models::{Article, ArticleChanges, NewArticle, NewUser, User, UserChanges, UserSummary},
};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, created_at, updated_at, deleted_at";

// Expects the article row aliased as `a` and its author as `u`.
const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.slug, a.image_url, a.category, \
     a.description, a.content, a.published, a.author_id, u.name AS author_name, \
     a.created_at, a.updated_at, a.deleted_at";

const ARTICLE_FROM: &str = "FROM articles a JOIN users u ON u.id = a.author_id";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are checked at runtime
/// (`query_as::<_, T>`), so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_articles(&self, filter: &str, order: &str) -> AppResult<Vec<Article>> {
        let sql = format!("{ARTICLE_SELECT} {ARTICLE_FROM} WHERE {filter} ORDER BY {order}");
        Ok(sqlx::query_as::<_, Article>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

/// like_pattern
///
/// Wraps user input in `%…%` for ILIKE, escaping the wildcard characters it contains.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn find_active_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_active_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn email_in_use(&self, email: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1)
                  AND deleted_at IS NULL
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// create_user
    ///
    /// A concurrent registration of the same email loses on `users_email_active_key`
    /// and comes back as `Conflict`.
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_active_users(&self) -> AppResult<Vec<UserSummary>> {
        Ok(sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                u.id, u.name, u.email, u.role, u.created_at, u.updated_at,
                (SELECT COUNT(*) FROM articles a
                  WHERE a.author_id = u.id AND a.published AND a.deleted_at IS NULL) AS article_count
            FROM users u
            WHERE u.deleted_at IS NULL
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// update_user
    ///
    /// `COALESCE` keeps every column whose change is `None`.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                password_hash = COALESCE($4, password_hash), \
                updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// soft_delete_user
    ///
    /// Articles first, then the account, in one transaction. Dropping `tx` on an early
    /// return rolls everything back.
    async fn soft_delete_user(&self, id: Uuid) -> AppResult<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let articles = sqlx::query(
            "UPDATE articles SET deleted_at = $2 WHERE author_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query(
            "UPDATE users SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if user.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!(user_id = %id, articles = articles.rows_affected(), "user soft-deleted with articles");
        Ok(true)
    }

    // --- PUBLISHED READS ---

    async fn list_published_articles(&self) -> AppResult<Vec<Article>> {
        self.fetch_articles("a.published AND a.deleted_at IS NULL", "a.created_at DESC")
            .await
    }

    /// search_published_articles
    ///
    /// QueryBuilder keeps the pattern parameterized; ILIKE makes it case-insensitive.
    async fn search_published_articles(&self, query: &str) -> AppResult<Vec<Article>> {
        let pattern = like_pattern(query);
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "{ARTICLE_SELECT} {ARTICLE_FROM} WHERE a.published AND a.deleted_at IS NULL"
        ));

        builder.push(" AND (a.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR u.name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR a.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR a.content ILIKE ");
        builder.push_bind(pattern);
        builder.push(") ORDER BY a.created_at DESC");

        Ok(builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_published_by_category(&self, category: &str) -> AppResult<Vec<Article>> {
        let sql = format!(
            "{ARTICLE_SELECT} {ARTICLE_FROM} \
             WHERE a.published AND a.deleted_at IS NULL AND LOWER(a.category) = LOWER($1) \
             ORDER BY a.created_at DESC"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_published_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>> {
        let sql = format!(
            "{ARTICLE_SELECT} {ARTICLE_FROM} \
             WHERE a.author_id = $1 AND a.published AND a.deleted_at IS NULL \
             ORDER BY a.created_at DESC"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_published_by_slug(&self, slug: &str) -> AppResult<Option<Article>> {
        let sql = format!(
            "{ARTICLE_SELECT} {ARTICLE_FROM} \
             WHERE a.slug = $1 AND a.published AND a.deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- AUTHOR / ADMIN READS ---

    async fn list_articles_by_author(&self, author_id: Uuid) -> AppResult<Vec<Article>> {
        let sql = format!(
            "{ARTICLE_SELECT} {ARTICLE_FROM} \
             WHERE a.author_id = $1 AND a.deleted_at IS NULL \
             ORDER BY a.created_at DESC"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_active_articles(&self) -> AppResult<Vec<Article>> {
        self.fetch_articles("a.deleted_at IS NULL", "a.updated_at DESC")
            .await
    }

    async fn find_active_article(&self, id: Uuid) -> AppResult<Option<Article>> {
        let sql = format!("{ARTICLE_SELECT} {ARTICLE_FROM} WHERE a.id = $1 AND a.deleted_at IS NULL");
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- ARTICLE WRITES ---

    async fn slug_in_use(&self, slug: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM articles
                WHERE slug = $1
                  AND deleted_at IS NULL
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// create_article
    ///
    /// Insert and author join in one statement via a CTE.
    async fn create_article(&self, article: NewArticle) -> AppResult<Article> {
        let sql = format!(
            "WITH written AS ( \
                INSERT INTO articles \
                    (id, title, slug, image_url, category, description, content, published, author_id, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) \
                RETURNING * \
             ) \
             {ARTICLE_SELECT} FROM written a JOIN users u ON u.id = a.author_id"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(Uuid::new_v4())
            .bind(article.title)
            .bind(article.slug)
            .bind(article.image_url)
            .bind(article.category)
            .bind(article.description)
            .bind(article.content)
            .bind(article.published)
            .bind(article.author_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> AppResult<Option<Article>> {
        let sql = format!(
            "WITH written AS ( \
                UPDATE articles SET \
                    title = COALESCE($2, title), \
                    slug = COALESCE($3, slug), \
                    image_url = COALESCE($4, image_url), \
                    category = COALESCE($5, category), \
                    description = COALESCE($6, description), \
                    content = COALESCE($7, content), \
                    published = COALESCE($8, published), \
                    updated_at = NOW() \
                WHERE id = $1 AND deleted_at IS NULL \
                RETURNING * \
             ) \
             {ARTICLE_SELECT} FROM written a JOIN users u ON u.id = a.author_id"
        );
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.slug)
            .bind(changes.image_url)
            .bind(changes.category)
            .bind(changes.description)
            .bind(changes.content)
            .bind(changes.published)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn soft_delete_article(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE articles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
