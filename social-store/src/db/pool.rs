//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits from [`StoreConfig`].

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::context::QueryContext;
use crate::error::Result;

/// How long to wait for a free connection before giving up.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a PostgreSQL connection pool sized from `config`.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default().merge_env()?;
/// let pool = create_pool(&config).await?;
/// ```
pub async fn create_pool(config: &StoreConfig) -> std::result::Result<PgPool, sqlx::Error> {
    let pool = create_pool_with_options(&config.database_url, pool_options(config)).await?;

    tracing::info!(
        max_connections = config.max_open_conns,
        "database connection pool established"
    );
    Ok(pool)
}

/// Pool limits from `config`. Connections open lazily; none are held warm.
pub fn pool_options(config: &StoreConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(0)
        .max_lifetime(config.max_conn_lifetime)
        .idle_timeout(config.max_idle_time)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Round-trip a trivial query to prove the database is reachable.
pub async fn ping(pool: &PgPool, ctx: &QueryContext) -> Result<()> {
    ctx.run(sqlx::query("SELECT 1").execute(pool)).await?;
    Ok(())
}

/// Create a PostgreSQL connection pool with custom options.
pub async fn create_pool_with_options(
    database_url: &str,
    options: PgPoolOptions,
) -> std::result::Result<PgPool, sqlx::Error> {
    options.connect(database_url).await
}
