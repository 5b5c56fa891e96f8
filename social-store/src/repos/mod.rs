//! Repository capabilities
//!
//! One trait per aggregate. Each has a Postgres implementation
//! ([`crate::postgres`]) and an in-memory one ([`crate::memory`]); callers
//! only ever see `Arc<dyn …Repository>` through [`crate::Storage`].
//!
//! Every method takes the caller's [`QueryContext`] first and is bounded by it.

use std::time::Duration;

use async_trait::async_trait;

use crate::context::QueryContext;
use crate::error::Result;
use crate::models::{Comment, FeedQuery, Post, PostWithMetadata, Role, User};
use crate::tx::StoreTx;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert inside the caller's transaction. Sets `id`, `created_at` and
    /// the resolved role. Duplicate username or email is a `Conflict`.
    async fn create(&self, ctx: &QueryContext, tx: &mut StoreTx, user: &mut User) -> Result<()>;

    /// Active users only.
    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<User>;

    /// Active users only.
    async fn get_by_email(&self, ctx: &QueryContext, email: &str) -> Result<User>;

    /// Insert the user inactive together with an invitation for `token`
    /// expiring after `ttl`. Both rows or neither.
    async fn create_and_invite(
        &self,
        ctx: &QueryContext,
        user: &mut User,
        token: &str,
        ttl: Duration,
    ) -> Result<()>;

    /// Consume a valid, unexpired invitation and activate its user.
    /// Unknown or expired tokens are `NotFound` and change nothing.
    async fn activate(&self, ctx: &QueryContext, token: &str) -> Result<()>;

    async fn delete(&self, ctx: &QueryContext, id: i64) -> Result<()>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, ctx: &QueryContext, post: &mut Post) -> Result<()>;

    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<Post>;

    /// Full-row update of title, content and tags. Last writer wins.
    async fn update(&self, ctx: &QueryContext, post: &mut Post) -> Result<()>;

    async fn delete_by_id(&self, ctx: &QueryContext, id: i64) -> Result<()>;

    /// Posts by the users `user_id` follows plus the user's own, filtered
    /// and paginated per `query`, ordered by `(created_at, id)`.
    async fn get_user_feed(
        &self,
        ctx: &QueryContext,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, ctx: &QueryContext, comment: &mut Comment) -> Result<()>;

    /// Oldest first.
    async fn get_by_post_id(&self, ctx: &QueryContext, post_id: i64) -> Result<Vec<Comment>>;
}

#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// Duplicate edges are a `Conflict`.
    async fn follow(&self, ctx: &QueryContext, follower_id: i64, followed_id: i64) -> Result<()>;

    /// Idempotent: removing a missing edge succeeds.
    async fn unfollow(&self, ctx: &QueryContext, follower_id: i64, followed_id: i64)
        -> Result<()>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_by_name(&self, ctx: &QueryContext, name: &str) -> Result<Role>;
}
