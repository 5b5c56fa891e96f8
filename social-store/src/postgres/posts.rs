//! Post repository and the user feed

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::models::{FeedQuery, Post, PostWithMetadata};
use crate::repos::PostRepository;

#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// ILIKE pattern matching `term` literally anywhere in the text.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn feed_sql(query: &FeedQuery) -> String {
    let dir = query.sort.as_sql();
    format!(
        r#"
        SELECT
            p.id, p.user_id, p.title, p.content, p.tags, p.created_at, p.updated_at,
            u.username,
            COUNT(c.id) AS comments_count
        FROM posts p
        JOIN users u ON u.id = p.user_id
        LEFT JOIN comments c ON c.post_id = p.id
        WHERE (
                p.user_id = $1
                OR p.user_id IN (SELECT f.user_id FROM followers f WHERE f.follower_id = $1)
            )
            AND ($2::text IS NULL OR p.title ILIKE $2 OR p.content ILIKE $2)
            AND (cardinality($3::text[]) = 0 OR p.tags && $3::text[])
            AND ($4::timestamptz IS NULL OR p.created_at >= $4)
            AND ($5::timestamptz IS NULL OR p.created_at <= $5)
        GROUP BY p.id, u.username
        ORDER BY p.created_at {dir}, p.id {dir}
        LIMIT $6 OFFSET $7
        "#
    )
}

#[async_trait]
impl PostRepository for PgPostStore {
    #[tracing::instrument(skip(self, ctx, post), fields(user_id = post.user_id))]
    async fn create(&self, ctx: &QueryContext, post: &mut Post) -> Result<()> {
        let row = ctx
            .run(
                sqlx::query(
                    r#"
                    INSERT INTO posts (content, title, user_id, tags)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, created_at, updated_at
                    "#,
                )
                .bind(&post.content)
                .bind(&post.title)
                .bind(post.user_id)
                .bind(&post.tags)
                .fetch_one(&self.pool),
            )
            .await?;

        post.id = row.try_get("id")?;
        post.created_at = row.try_get("created_at")?;
        post.updated_at = row.try_get("updated_at")?;
        Ok(())
    }

    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<Post> {
        ctx.run(
            sqlx::query_as::<_, Post>(
                r#"
                SELECT id, user_id, title, content, tags, created_at, updated_at
                FROM posts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::not_found("post", id))
    }

    #[tracing::instrument(skip(self, ctx, post), fields(post_id = post.id))]
    async fn update(&self, ctx: &QueryContext, post: &mut Post) -> Result<()> {
        let updated_at = ctx
            .run(
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    r#"
                    UPDATE posts
                    SET title = $1, content = $2, tags = $3, updated_at = NOW()
                    WHERE id = $4
                    RETURNING updated_at
                    "#,
                )
                .bind(&post.title)
                .bind(&post.content)
                .bind(&post.tags)
                .bind(post.id)
                .fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(|| StoreError::not_found("post", post.id))?;

        post.updated_at = updated_at;
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn delete_by_id(&self, ctx: &QueryContext, id: i64) -> Result<()> {
        let result = ctx
            .run(
                sqlx::query("DELETE FROM posts WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }

    async fn get_user_feed(
        &self,
        ctx: &QueryContext,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>> {
        query.validate()?;

        let sql = feed_sql(query);
        let search = query.search_term().map(contains_pattern);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = ctx
            .run(
                sqlx::query_as::<_, PostWithMetadata>(&sql)
                    .bind(user_id)
                    .bind(search)
                    .bind(&query.tags)
                    .bind(query.since)
                    .bind(query.until)
                    .bind(i64::from(query.limit))
                    .bind(offset)
                    .fetch_all(&self.pool),
            )
            .await?;

        tracing::debug!(user_id, rows = rows.len(), "feed query");
        Ok(rows)
    }
}
