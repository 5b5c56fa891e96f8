//! Postgres repositories
//!
//! # Design Principles
//!
//! - One shared `PgPool`, cloned into every store
//! - Reads JOIN what they return (author, role, comment count), no N+1
//! - Uniqueness is left to the database; violations become `Conflict`
//! - Multi-step writes run in one transaction
//! - Every statement runs under the caller's `QueryContext`

mod comments;
mod followers;
mod posts;
mod roles;
mod users;

pub use comments::PgCommentStore;
pub use followers::PgFollowerStore;
pub use posts::PgPostStore;
pub use roles::PgRoleStore;
pub use users::PgUserStore;

use sqlx::PgPool;

use crate::context::QueryContext;
use crate::error::Result;
use crate::tx::{PgTransactions, StoreTx, TransactionCoordinator};

/// Begin a transaction on `pool` for a repository's own multi-step write.
pub(crate) async fn begin(pool: &PgPool, ctx: &QueryContext) -> Result<StoreTx> {
    PgTransactions::new(pool.clone()).begin(ctx).await
}

/// Test helpers shared by the Postgres store tests.
#[cfg(test)]
pub(crate) mod testing {
    use sqlx::PgPool;

    use crate::context::QueryContext;
    use crate::models::User;
    use crate::repos::UserRepository;

    use super::{begin, PgUserStore};

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p social-store -- --ignored

    pub async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool)
            .await
            .expect("migrations failed");
        pool
    }

    pub fn unique(prefix: &str) -> String {
        use rand::Rng;
        format!("{prefix}-{:012x}", rand::thread_rng().gen::<u64>() >> 16)
    }

    pub async fn active_user(pool: &PgPool, prefix: &str) -> User {
        let ctx = QueryContext::background();
        let store = PgUserStore::new(pool.clone());
        let name = unique(prefix);
        let mut user = User::new(&name, format!("{name}@example.com"));
        user.is_active = true;

        let mut tx = begin(pool, &ctx).await.expect("begin");
        store
            .create(&ctx, &mut tx, &mut user)
            .await
            .expect("create user");
        tx.commit().await.expect("commit");
        user
    }
}
