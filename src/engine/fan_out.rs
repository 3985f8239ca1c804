//! Run driver: listing fetch, fan-out, fan-in.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::completion::CompletionTracker;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fetcher::{ListingSource, ResourceFetcher};
use crate::types::{AggregateResult, Record};

use super::aggregate::aggregate;
use super::dispatch::dispatch;

/// Concurrent fan-out/fan-in over one [`ResourceFetcher`].
///
/// Every run starts one task per parent eagerly; there is no concurrency cap.
pub struct FanOut<F> {
    fetcher: Arc<F>,
    config: EngineConfig,
}

impl<F: ResourceFetcher> FanOut<F> {
    /// Create a driver with the default engine configuration.
    pub fn new(fetcher: F) -> Self {
        Self::with_config(Arc::new(fetcher), EngineConfig::default())
    }

    /// Create a driver sharing an existing fetcher.
    pub fn with_config(fetcher: Arc<F>, config: EngineConfig) -> Self {
        Self { fetcher, config }
    }

    /// The fetcher used for every dispatched task
    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Fetch the parent listing, then aggregate every parent's children.
    ///
    /// A listing failure is returned before any fetch task is started.
    pub async fn run<L>(&self, listing: &L) -> Result<AggregateResult<L::Parent, F::Child>>
    where
        L: ListingSource,
    {
        let parents = listing.fetch_parents().await.inspect_err(|e| {
            tracing::error!(error = %e, "parent listing failed, aborting run");
        })?;
        tracing::info!(parents = parents.len(), "fetched parent listing");
        self.aggregate(parents).await
    }

    /// Fetch every parent's children concurrently and gather them by parent id.
    ///
    /// Returns only after every dispatched task has reported. Failed fetches are
    /// recorded per parent in the result; they never fail the call.
    pub async fn aggregate<P>(&self, parents: Vec<P>) -> Result<AggregateResult<P, F::Child>>
    where
        P: Record,
    {
        let parents = if self.config.dedupe_parents {
            dedupe_parents(parents)
        } else {
            parents
        };

        let tracker = CompletionTracker::new();
        let (sink, outcomes) = mpsc::channel(parents.len().max(1));
        let mut tasks = dispatch(&parents, Arc::clone(&self.fetcher), sink, &tracker)?;
        let completion = tracker.done();
        drop(tracker);

        let result = aggregate(parents, outcomes, completion).await;
        reap(&mut tasks).await;

        let stats = result.stats();
        tracing::info!(
            parents = result.len(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            children = stats.children,
            elapsed_ms = elapsed_ms(stats.elapsed),
            "aggregation complete"
        );
        Ok(result)
    }
}

/// Keep the first record for every id, preserving listing order.
pub(super) fn dedupe_parents<P: Record>(parents: Vec<P>) -> Vec<P> {
    let mut seen = HashSet::with_capacity(parents.len());
    parents
        .into_iter()
        .filter(|parent| {
            let id = parent.id();
            let first = seen.insert(id);
            if !first {
                tracing::warn!(parent_id = id.0, "dropping duplicate parent id");
            }
            first
        })
        .collect()
}

/// Join every finished worker. By now each has delivered its outcome.
async fn reap(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "fetch task did not finish cleanly");
        }
    }
}

/// Whole milliseconds of `elapsed`, saturating at `u64::MAX`.
pub(super) fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
