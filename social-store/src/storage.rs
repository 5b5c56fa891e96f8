//! Storage facade
//!
//! Bundles one implementation of every repository plus the matching
//! transaction coordinator. Built once at startup and cloned into
//! whatever needs it.

use std::fmt;
use std::sync::Arc;

use sqlx::PgPool;

use crate::memory::MemoryDb;
use crate::postgres::{PgCommentStore, PgFollowerStore, PgPostStore, PgRoleStore, PgUserStore};
use crate::repos::{
    CommentRepository, FollowerRepository, PostRepository, RoleRepository, UserRepository,
};
use crate::tx::{PgTransactions, TransactionCoordinator};

#[derive(Clone)]
pub struct Storage {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub followers: Arc<dyn FollowerRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub transactions: Arc<dyn TransactionCoordinator>,
    backend: &'static str,
}

impl Storage {
    /// Postgres-backed repositories sharing `pool`.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            posts: Arc::new(PgPostStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool.clone())),
            followers: Arc::new(PgFollowerStore::new(pool.clone())),
            roles: Arc::new(PgRoleStore::new(pool.clone())),
            transactions: Arc::new(PgTransactions::new(pool)),
            backend: "postgres",
        }
    }

    /// Fresh, empty in-memory store with the reference roles installed.
    pub fn in_memory() -> Self {
        Self::from_memory(&MemoryDb::new())
    }

    /// In-memory repositories over an existing [`MemoryDb`], so tests can
    /// keep a handle for inspection.
    pub fn from_memory(db: &MemoryDb) -> Self {
        Self {
            posts: Arc::new(db.posts()),
            users: Arc::new(db.users()),
            comments: Arc::new(db.comments()),
            followers: Arc::new(db.followers()),
            roles: Arc::new(db.roles()),
            transactions: Arc::new(db.clone()),
            backend: "memory",
        }
    }

    /// Swap the user repository, e.g. for a failure-injecting double.
    pub fn with_users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = users;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
