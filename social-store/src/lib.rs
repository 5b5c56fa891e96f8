//! social-store: persistence layer for the social network
//!
//! Repositories for users, posts, comments, follower edges and roles,
//! a scoped-transaction coordinator, and a cache-aside user cache.
//! Every repository has a Postgres implementation and an in-memory one;
//! [`Storage`] bundles whichever set the caller picked.

pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod seed;
pub mod storage;
pub mod tx;

pub use cache::{lookup_user, MemoryUserCache, NoopUserCache, RedisUserCache, UserCache};
pub use config::{ConfigError, RedisConfig, StoreConfig};
pub use context::QueryContext;
pub use error::{ErrorKind, Result, StoreError};
pub use models::{
    Comment, CommentAuthor, FeedQuery, FeedQueryParams, Password, Post, PostWithMetadata, Role,
    SortDirection, User,
};
pub use repos::{
    CommentRepository, FollowerRepository, PostRepository, RoleRepository, UserRepository,
};
pub use storage::Storage;
pub use tx::{with_transaction, StoreTx, TransactionCoordinator};
