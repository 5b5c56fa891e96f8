//! Cache-aside user cache
//!
//! The cache is an optimization only. A failed cache read degrades to a
//! repository read and a failed populate is logged, so callers of
//! [`lookup_user`] never see a cache error. Entries expire by TTL; there
//! is no invalidation beyond callers writing through with `set`.

mod memory;
mod redis;

pub use self::memory::MemoryUserCache;
pub use self::redis::RedisUserCache;

use async_trait::async_trait;

use crate::context::QueryContext;
use crate::error::Result;
use crate::models::User;
use crate::repos::UserRepository;

#[async_trait]
pub trait UserCache: Send + Sync {
    /// `Ok(None)` on a miss.
    async fn get(&self, ctx: &QueryContext, user_id: i64) -> Result<Option<User>>;

    /// Insert or overwrite the entry for `user.id`.
    async fn set(&self, ctx: &QueryContext, user: &User) -> Result<()>;
}

/// Cache key for a user id
pub fn user_key(user_id: i64) -> String {
    format!("user-{user_id}")
}

/// Always misses. Used when caching is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUserCache;

#[async_trait]
impl UserCache for NoopUserCache {
    async fn get(&self, _ctx: &QueryContext, _user_id: i64) -> Result<Option<User>> {
        Ok(None)
    }

    async fn set(&self, _ctx: &QueryContext, _user: &User) -> Result<()> {
        Ok(())
    }
}

/// Read a user through the cache: hit returns directly, miss reads the
/// repository and populates the cache.
pub async fn lookup_user(
    users: &dyn UserRepository,
    cache: &dyn UserCache,
    ctx: &QueryContext,
    user_id: i64,
) -> Result<User> {
    match cache.get(ctx, user_id).await {
        Ok(Some(user)) => {
            tracing::debug!(user_id, "user cache hit");
            return Ok(user);
        }
        Ok(None) => tracing::debug!(user_id, "user cache miss"),
        Err(err) => tracing::warn!(user_id, error = %err, "user cache read failed, using store"),
    }

    let user = users.get_by_id(ctx, user_id).await?;

    if let Err(err) = cache.set(ctx, &user).await {
        tracing::warn!(user_id, error = %err, "user cache populate failed");
    }
    Ok(user)
}
