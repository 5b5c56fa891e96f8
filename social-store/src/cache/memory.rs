use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::UserCache;
use crate::context::QueryContext;
use crate::error::Result;
use crate::models::User;

/// Process-local user cache with the same JSON entries and TTL semantics
/// as the Redis cache.
#[derive(Debug, Clone)]
pub struct MemoryUserCache {
    entries: Arc<RwLock<HashMap<i64, (String, Instant)>>>,
    ttl: Duration,
}

impl MemoryUserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, _ctx: &QueryContext, user_id: i64) -> Result<Option<User>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(&user_id) {
            Some((json, expires)) if *expires > now => {
                return Ok(Some(serde_json::from_str(json)?));
            }
            Some(_) => {}
            None => return Ok(None),
        }

        entries.remove(&user_id);
        tracing::debug!(user_id, "evicted expired user cache entry");
        Ok(None)
    }

    async fn set(&self, _ctx: &QueryContext, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(user.id, (json, now + self.ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Password;

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = MemoryUserCache::new(Duration::from_secs(60));
        let ctx = QueryContext::background();
        let mut user = User::new("ttl", "ttl@example.com");
        user.id = 1;

        cache.set(&ctx, &user).await.expect("set");
        assert!(cache.get(&ctx, 1).await.expect("get").is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get(&ctx, 1).await.expect("get").is_none());
        assert!(cache.is_empty().await);
        assert_eq!(cache.entries.read().await.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn set_prunes_expired_entries() {
        let cache = MemoryUserCache::new(Duration::from_secs(60));
        let ctx = QueryContext::background();
        for id in 1..=3 {
            let mut user = User::new(format!("old{id}"), format!("old{id}@example.com"));
            user.id = id;
            cache.set(&ctx, &user).await.expect("set");
        }

        tokio::time::advance(Duration::from_secs(61)).await;
        let mut fresh = User::new("fresh", "fresh@example.com");
        fresh.id = 10;
        cache.set(&ctx, &fresh).await.expect("set");

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&10));
    }

    #[tokio::test]
    async fn cached_user_carries_no_password() {
        let cache = MemoryUserCache::new(Duration::from_secs(60));
        let ctx = QueryContext::background();
        let mut user = User::new("secret", "secret@example.com");
        user.id = 2;
        user.password = Password::hashed("hunter2").expect("hash");

        cache.set(&ctx, &user).await.expect("set");
        let cached = cache.get(&ctx, 2).await.expect("get").expect("hit");
        assert!(!cached.password.is_set());
        assert_eq!(cached.email, user.email);
    }
}
