use anyhow::{Context, Result};
use social_store::db::ping;
use social_store::{QueryContext, RedisUserCache, StoreConfig};

use crate::app::App;

pub async fn run_health(config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    let app = App::connect(config).await?;
    ping(&app.pool, ctx).await.context("Database ping failed")?;
    println!("database: ok");

    if config.redis.enabled {
        let cache = RedisUserCache::connect(&config.redis, ctx)
            .await
            .with_context(|| format!("Failed to connect to Redis at {}", config.redis.addr))?;
        cache.ping(ctx).await.context("Redis ping failed")?;
        println!("cache: ok");
    } else {
        println!("cache: disabled");
    }
    Ok(())
}
