//! In-memory backend
//!
//! All five repositories over one shared [`MemoryState`]. A transaction
//! takes the state lock for its whole lifetime and works on a staged
//! copy that replaces the live state on commit, so writers are serialized
//! and a rollback leaves no trace. Do not call non-transactional methods
//! of this backend from inside one of its open transactions: they wait on
//! the same lock.

mod state;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use state::MemoryState;

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::models::{
    hash_token, invitation_expiry, Comment, FeedQuery, Post, PostWithMetadata, Role, User,
};
use crate::repos::{
    CommentRepository, FollowerRepository, PostRepository, RoleRepository, UserRepository,
};
use crate::tx::{StoreTx, TransactionCoordinator};

/// Shared handle to the in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    state: Arc<Mutex<MemoryState>>,
}

/// Staged state of an open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTx {
    pub(crate) fn state_mut(&mut self) -> &mut MemoryState {
        &mut self.staged
    }

    pub(crate) fn commit(self) {
        let MemoryTx { mut guard, staged } = self;
        *guard = staged;
    }

    pub(crate) fn rollback(self) {}
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock(&self, ctx: &QueryContext) -> Result<OwnedMutexGuard<MemoryState>> {
        let state = Arc::clone(&self.state);
        ctx.run(async move { Ok::<_, StoreError>(state.lock_owned().await) })
            .await
    }

    pub fn users(&self) -> MemoryUserStore {
        MemoryUserStore { db: self.clone() }
    }

    pub fn posts(&self) -> MemoryPostStore {
        MemoryPostStore { db: self.clone() }
    }

    pub fn comments(&self) -> MemoryCommentStore {
        MemoryCommentStore { db: self.clone() }
    }

    pub fn followers(&self) -> MemoryFollowerStore {
        MemoryFollowerStore { db: self.clone() }
    }

    pub fn roles(&self) -> MemoryRoleStore {
        MemoryRoleStore { db: self.clone() }
    }

    pub async fn invitation_count(&self) -> usize {
        self.state.lock().await.invitation_count()
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.user_count()
    }

    /// Activation state of a user regardless of whether it is active.
    pub async fn is_active(&self, user_id: i64) -> Option<bool> {
        self.state.lock().await.user(user_id).map(|u| u.is_active)
    }
}

#[async_trait]
impl TransactionCoordinator for MemoryDb {
    async fn begin(&self, ctx: &QueryContext) -> Result<StoreTx> {
        let guard = self.lock(ctx).await?;
        let staged = guard.clone();
        Ok(StoreTx::memory(MemoryTx { guard, staged }))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryUserStore {
    db: MemoryDb,
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, _ctx: &QueryContext, tx: &mut StoreTx, user: &mut User) -> Result<()> {
        tx.memory_state()?.insert_user(user)
    }

    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<User> {
        self.db.lock(ctx).await?.active_user(id)
    }

    async fn get_by_email(&self, ctx: &QueryContext, email: &str) -> Result<User> {
        self.db.lock(ctx).await?.active_user_by_email(email)
    }

    async fn create_and_invite(
        &self,
        ctx: &QueryContext,
        user: &mut User,
        token: &str,
        ttl: Duration,
    ) -> Result<()> {
        let expiry = invitation_expiry(ttl)?;
        let mut tx = self.db.begin(ctx).await?;
        let mut staged_user = user.clone();
        staged_user.is_active = false;

        let outcome = (|| {
            let state = tx.memory_state()?;
            state.insert_user(&mut staged_user)?;
            state.insert_invitation(hash_token(token), staged_user.id, expiry)
        })();
        tx.finish(outcome).await?;

        *user = staged_user;
        Ok(())
    }

    async fn activate(&self, ctx: &QueryContext, token: &str) -> Result<()> {
        let mut tx = self.db.begin(ctx).await?;
        let outcome = tx
            .memory_state()
            .and_then(|state| state.activate(&hash_token(token), Utc::now()));
        tx.finish(outcome).await.map(|_| ())
    }

    async fn delete(&self, ctx: &QueryContext, id: i64) -> Result<()> {
        let mut tx = self.db.begin(ctx).await?;
        let outcome = tx.memory_state().and_then(|state| state.delete_user(id));
        tx.finish(outcome).await
    }
}

#[derive(Debug, Clone)]
pub struct MemoryPostStore {
    db: MemoryDb,
}

#[async_trait]
impl PostRepository for MemoryPostStore {
    async fn create(&self, ctx: &QueryContext, post: &mut Post) -> Result<()> {
        self.db.lock(ctx).await?.insert_post(post)
    }

    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<Post> {
        self.db.lock(ctx).await?.post(id)
    }

    async fn update(&self, ctx: &QueryContext, post: &mut Post) -> Result<()> {
        self.db.lock(ctx).await?.update_post(post)
    }

    async fn delete_by_id(&self, ctx: &QueryContext, id: i64) -> Result<()> {
        self.db.lock(ctx).await?.delete_post(id)
    }

    async fn get_user_feed(
        &self,
        ctx: &QueryContext,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>> {
        query.validate()?;
        Ok(self.db.lock(ctx).await?.feed(user_id, query))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCommentStore {
    db: MemoryDb,
}

#[async_trait]
impl CommentRepository for MemoryCommentStore {
    async fn create(&self, ctx: &QueryContext, comment: &mut Comment) -> Result<()> {
        self.db.lock(ctx).await?.insert_comment(comment)
    }

    async fn get_by_post_id(&self, ctx: &QueryContext, post_id: i64) -> Result<Vec<Comment>> {
        Ok(self.db.lock(ctx).await?.comments_for_post(post_id))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryFollowerStore {
    db: MemoryDb,
}

#[async_trait]
impl FollowerRepository for MemoryFollowerStore {
    async fn follow(&self, ctx: &QueryContext, follower_id: i64, followed_id: i64) -> Result<()> {
        self.db.lock(ctx).await?.follow(follower_id, followed_id)
    }

    async fn unfollow(
        &self,
        ctx: &QueryContext,
        follower_id: i64,
        followed_id: i64,
    ) -> Result<()> {
        self.db.lock(ctx).await?.unfollow(follower_id, followed_id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryRoleStore {
    db: MemoryDb,
}

#[async_trait]
impl RoleRepository for MemoryRoleStore {
    async fn get_by_name(&self, ctx: &QueryContext, name: &str) -> Result<Role> {
        self.db
            .lock(ctx)
            .await?
            .role_by_name(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("role", name))
    }
}
