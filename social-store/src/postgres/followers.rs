use async_trait::async_trait;
use sqlx::PgPool;

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::repos::FollowerRepository;

/// Follower edges. The row's `user_id` is the followed user.
#[derive(Debug, Clone)]
pub struct PgFollowerStore {
    pool: PgPool,
}

impl PgFollowerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowerRepository for PgFollowerStore {
    #[tracing::instrument(skip(self, ctx))]
    async fn follow(&self, ctx: &QueryContext, follower_id: i64, followed_id: i64) -> Result<()> {
        // The primary key decides concurrent duplicates; no check-then-insert
        ctx.run(async {
            sqlx::query("INSERT INTO followers (user_id, follower_id) VALUES ($1, $2)")
                .bind(followed_id)
                .bind(follower_id)
                .execute(&self.pool)
                .await
                .map_err(|err| StoreError::from_insert(err, "follower"))
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn unfollow(
        &self,
        ctx: &QueryContext,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<()> {
        ctx.run(
            sqlx::query("DELETE FROM followers WHERE user_id = $1 AND follower_id = $2")
                .bind(followed_id)
                .bind(follower_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::testing;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_duplicate_follow_yields_one_conflict() {
        let pool = testing::pool().await;
        let store = PgFollowerStore::new(pool.clone());
        let a = testing::active_user(&pool, "fan").await;
        let b = testing::active_user(&pool, "idol").await;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .follow(&QueryContext::background(), a.id, b.id)
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.expect("task panicked") {
                Ok(()) => ok += 1,
                Err(err) if err.is_conflict() => conflicts += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!((ok, conflicts), (1, 1));

        let ctx = QueryContext::background();
        store.unfollow(&ctx, a.id, b.id).await.expect("unfollow");
        store.unfollow(&ctx, a.id, b.id).await.expect("unfollow again");
    }
}
