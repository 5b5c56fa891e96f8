//! Scoped transactions
//!
//! A [`StoreTx`] commits only when told to; dropping it or finishing it
//! with an error rolls back. Rollback failures are logged and never mask
//! the error that caused the rollback. Nothing here retries.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::memory::{MemoryState, MemoryTx};

/// Begins transactions against one backend.
#[async_trait]
pub trait TransactionCoordinator: Send + Sync {
    async fn begin(&self, ctx: &QueryContext) -> Result<StoreTx>;
}

/// Backend-tagged transaction handle passed to repository methods that
/// take part in a caller-driven atomic sequence.
pub struct StoreTx {
    inner: TxInner,
}

enum TxInner {
    Postgres(Transaction<'static, Postgres>),
    Memory(MemoryTx),
}

impl StoreTx {
    pub(crate) fn postgres(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            inner: TxInner::Postgres(tx),
        }
    }

    pub(crate) fn memory(tx: MemoryTx) -> Self {
        Self {
            inner: TxInner::Memory(tx),
        }
    }

    pub(crate) fn pg_conn(&mut self) -> Result<&mut PgConnection> {
        match &mut self.inner {
            TxInner::Postgres(tx) => Ok(&mut **tx),
            TxInner::Memory(_) => Err(StoreError::BackendMismatch),
        }
    }

    pub(crate) fn memory_state(&mut self) -> Result<&mut MemoryState> {
        match &mut self.inner {
            TxInner::Memory(tx) => Ok(tx.state_mut()),
            TxInner::Postgres(_) => Err(StoreError::BackendMismatch),
        }
    }

    pub async fn commit(self) -> Result<()> {
        match self.inner {
            TxInner::Postgres(tx) => tx.commit().await?,
            TxInner::Memory(tx) => tx.commit(),
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        match self.inner {
            TxInner::Postgres(tx) => tx.rollback().await?,
            TxInner::Memory(tx) => tx.rollback(),
        }
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err` and hand the original error back.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        cause = %err,
                        "transaction rollback failed"
                    );
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for StoreTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.inner {
            TxInner::Postgres(_) => "postgres",
            TxInner::Memory(_) => "memory",
        };
        f.debug_struct("StoreTx").field("backend", &backend).finish()
    }
}

/// Run `f` inside a transaction: commit if it succeeds, roll back if it fails.
///
/// The closure receives the handle and returns a boxed future borrowing it;
/// anything else it needs must be moved in.
///
/// ```ignore
/// let users = storage.users.clone();
/// let ctx2 = ctx.clone();
/// with_transaction(storage.transactions.as_ref(), &ctx, move |tx| {
///     Box::pin(async move {
///         users.create(&ctx2, tx, &mut user).await?;
///         Ok(user)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, F>(
    coordinator: &dyn TransactionCoordinator,
    ctx: &QueryContext,
    f: F,
) -> Result<T>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut StoreTx) -> BoxFuture<'t, Result<T>> + Send,
{
    let mut tx = coordinator.begin(ctx).await?;
    let outcome = f(&mut tx).await;
    tx.finish(outcome).await
}

/// Postgres transaction coordinator over the shared pool.
#[derive(Debug, Clone)]
pub struct PgTransactions {
    pool: PgPool,
}

impl PgTransactions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionCoordinator for PgTransactions {
    async fn begin(&self, ctx: &QueryContext) -> Result<StoreTx> {
        let tx = ctx.run(self.pool.begin()).await?;
        Ok(StoreTx::postgres(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDb;
    use crate::models::User;
    use crate::repos::UserRepository;

    #[tokio::test]
    async fn commits_on_success() {
        let db = MemoryDb::new();
        let users = db.users();
        let ctx = QueryContext::background();

        let repo = users.clone();
        let tx_ctx = ctx.clone();
        let created = with_transaction(&db, &ctx, move |tx| {
            Box::pin(async move {
                let mut user = User::new("alice", "alice@example.com");
                user.is_active = true;
                repo.create(&tx_ctx, tx, &mut user).await?;
                Ok::<_, StoreError>(user)
            })
        })
        .await
        .expect("transaction commits");

        let fetched = users.get_by_id(&ctx, created.id).await.expect("user visible");
        assert_eq!(fetched.username, "alice");
    }

    #[tokio::test]
    async fn rolls_back_and_returns_original_error() {
        let db = MemoryDb::new();
        let users = db.users();
        let ctx = QueryContext::background();

        let repo = users.clone();
        let tx_ctx = ctx.clone();
        let err = with_transaction(&db, &ctx, move |tx| {
            Box::pin(async move {
                let mut user = User::new("bob", "bob@example.com");
                user.is_active = true;
                repo.create(&tx_ctx, tx, &mut user).await?;
                Err::<(), _>(StoreError::not_found("injected", 0))
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { resource: "injected", .. }));
        let err = users
            .get_by_email(&ctx, "bob@example.com")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_handle_rejected_by_postgres_accessor() {
        let db = MemoryDb::new();
        let mut tx = db.begin(&QueryContext::background()).await.expect("begin");
        assert!(matches!(tx.pg_conn(), Err(StoreError::BackendMismatch)));
        tx.rollback().await.expect("rollback");
    }
}
