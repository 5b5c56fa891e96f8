//! Connections shared by the commands

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use social_store::db::{create_pool, PgPool};
use social_store::{
    NoopUserCache, QueryContext, RedisUserCache, Storage, StoreConfig, UserCache,
};

pub struct App {
    pub pool: PgPool,
    pub storage: Storage,
}

impl App {
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = create_pool(config)
            .await
            .context("Failed to create database pool")?;
        let storage = Storage::postgres(pool.clone());
        Ok(Self { pool, storage })
    }
}

/// The user cache selected by config: Redis when enabled, otherwise none.
///
/// An unreachable Redis is logged and treated as no cache, so reads fall
/// through to the database.
pub async fn user_cache(config: &StoreConfig, ctx: &QueryContext) -> Arc<dyn UserCache> {
    if !config.redis.enabled {
        return Arc::new(NoopUserCache);
    }
    match RedisUserCache::connect(&config.redis, ctx).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            tracing::warn!(
                addr = %config.redis.addr,
                error = %err,
                "redis unavailable, reading users without cache"
            );
            Arc::new(NoopUserCache)
        }
    }
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn unreachable_redis_falls_back_to_no_cache() {
        let mut config = StoreConfig::default();
        config.redis.enabled = true;
        config.redis.addr = "127.0.0.1:1".to_string();
        let ctx = QueryContext::new(Duration::from_millis(200));

        let cache = tokio::time::timeout(Duration::from_secs(10), user_cache(&config, &ctx))
            .await
            .expect("cache selection should not outlive the query budget");

        // Every read is a miss, so lookups go to the repository
        assert!(cache.get(&ctx, 1).await.expect("noop get").is_none());
    }

    #[tokio::test]
    async fn disabled_cache_is_noop() {
        let mut config = StoreConfig::default();
        config.redis.enabled = false;
        let ctx = QueryContext::background();

        let cache = user_cache(&config, &ctx).await;
        assert!(cache.get(&ctx, 7).await.expect("noop get").is_none());
    }
}
