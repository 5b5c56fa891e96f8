use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{user_key, UserCache};
use crate::config::RedisConfig;
use crate::context::QueryContext;
use crate::error::Result;
use crate::models::User;

/// Users cached in Redis as JSON under `user-{id}` with a TTL.
#[derive(Clone)]
pub struct RedisUserCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl fmt::Debug for RedisUserCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisUserCache")
            .field("connection", &"ConnectionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RedisUserCache {
    /// Connect under `ctx`'s bounds. An unreachable server fails with
    /// `Timeout` once the query budget is spent instead of retrying forever.
    pub async fn connect(config: &RedisConfig, ctx: &QueryContext) -> Result<Self> {
        tracing::info!(addr = %config.addr, db = config.db, "connecting to redis");
        let client = redis::Client::open(config.url())?;
        let conn = ctx.run(ConnectionManager::new(client)).await?;
        Ok(Self::new(conn, config.user_ttl))
    }

    pub fn new(conn: ConnectionManager, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    pub async fn ping(&self, ctx: &QueryContext) -> Result<()> {
        let mut conn = self.conn.clone();
        ctx.run(redis::cmd("PING").query_async::<String>(&mut conn))
            .await?;
        Ok(())
    }

    /// Whole seconds for SETEX, never zero.
    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, ctx: &QueryContext, user_id: i64) -> Result<Option<User>> {
        let key = user_key(user_id);
        let mut conn = self.conn.clone();
        let data: Option<String> = ctx.run(conn.get(&key)).await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, ctx: &QueryContext, user: &User) -> Result<()> {
        let key = user_key(user.id);
        let json = serde_json::to_string(user)?;
        tracing::debug!(%key, ttl = ?self.ttl, "user cache set");

        let mut conn = self.conn.clone();
        ctx.run(conn.set_ex::<_, _, ()>(&key, json, self.ttl_secs()))
            .await
    }
}
