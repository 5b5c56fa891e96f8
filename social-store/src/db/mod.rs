//! Database layer - connection pool and schema
//!
//! # Design Principles
//!
//! - One pool per process, passed explicitly; no global connection
//! - Pool limits come from `StoreConfig`
//! - Schema is created idempotently at startup or via `social migrate`

pub mod migrations;
pub mod pool;

pub use pool::{create_pool, create_pool_with_options, ping, pool_options};
pub use sqlx::PgPool;
