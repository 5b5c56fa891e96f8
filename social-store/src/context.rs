//! Per-call query context: deadline, cancellation and the query timeout.
//!
//! Every repository and cache method takes a `&QueryContext` first. Each
//! individual query is bounded by `query_timeout` and, if the caller set
//! one, by the caller's deadline, whichever comes first. Cancelling the
//! token aborts the in-flight query; commits are never raced against it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StoreError};

/// Default upper bound for a single query
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct QueryContext {
    deadline: Option<Instant>,
    query_timeout: Duration,
    cancel: CancellationToken,
}

impl QueryContext {
    pub fn new(query_timeout: Duration) -> Self {
        Self {
            deadline: None,
            query_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Context with no caller deadline and the default query timeout.
    pub fn background() -> Self {
        Self::new(QUERY_TIMEOUT)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time budget for the next query.
    pub fn budget(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.query_timeout),
            None => self.query_timeout,
        }
    }

    /// Run one store operation under this context's bounds.
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<StoreError>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let budget = self.budget();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            outcome = tokio::time::timeout(budget, fut) => match outcome {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(StoreError::Timeout { after: budget }),
            },
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_within_budget() {
        let ctx = QueryContext::background();
        let value = ctx
            .run(async { Ok::<_, StoreError>(7) })
            .await
            .expect("query should complete");
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_query_times_out() {
        let ctx = QueryContext::new(Duration::from_millis(50));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn caller_deadline_shrinks_budget() {
        let ctx = QueryContext::background().with_timeout(Duration::from_millis(100));
        assert!(ctx.budget() <= Duration::from_millis(100));

        let ctx = QueryContext::new(Duration::from_millis(20))
            .with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.budget(), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn cancelled_context_aborts_query() {
        let ctx = QueryContext::background();
        ctx.cancel();
        let err = ctx
            .run(async { Ok::<_, StoreError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_in_flight_query() {
        let ctx = QueryContext::new(Duration::from_secs(60));
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }
}
