use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::context::QueryContext;
use crate::error::Result;
use crate::models::{Comment, CommentAuthor};
use crate::repos::CommentRepository;

#[derive(Debug, Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> std::result::Result<Comment, sqlx::Error> {
    let user_id: i64 = row.try_get("user_id")?;
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_id,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        user: CommentAuthor {
            id: user_id,
            username: row.try_get("username")?,
        },
    })
}

#[async_trait]
impl CommentRepository for PgCommentStore {
    #[tracing::instrument(skip(self, ctx, comment), fields(post_id = comment.post_id))]
    async fn create(&self, ctx: &QueryContext, comment: &mut Comment) -> Result<()> {
        // Insert and read the author back in one round trip
        let row = ctx
            .run(
                sqlx::query(
                    r#"
                    WITH inserted AS (
                        INSERT INTO comments (post_id, user_id, content)
                        VALUES ($1, $2, $3)
                        RETURNING id, user_id, created_at
                    )
                    SELECT i.id, i.created_at, u.username
                    FROM inserted i
                    JOIN users u ON u.id = i.user_id
                    "#,
                )
                .bind(comment.post_id)
                .bind(comment.user_id)
                .bind(&comment.content)
                .fetch_one(&self.pool),
            )
            .await?;

        comment.id = row.try_get("id")?;
        comment.created_at = row.try_get("created_at")?;
        comment.user = CommentAuthor {
            id: comment.user_id,
            username: row.try_get("username")?,
        };
        Ok(())
    }

    async fn get_by_post_id(&self, ctx: &QueryContext, post_id: i64) -> Result<Vec<Comment>> {
        let rows = ctx
            .run(
                sqlx::query(
                    r#"
                    SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, u.username
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    WHERE c.post_id = $1
                    ORDER BY c.created_at ASC, c.id ASC
                    "#,
                )
                .bind(post_id)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows
            .iter()
            .map(comment_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }
}
