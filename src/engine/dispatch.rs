//! Fan-out: one concurrent fetch task per parent, each emitting exactly one outcome.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::completion::CompletionTracker;
use crate::error::{FetchError, Result};
use crate::fetcher::ResourceFetcher;
use crate::types::{Outcome, ParentId, Record};

/// Spawn one fetch task per parent.
///
/// All `parents.len()` units are registered with `tracker` before the first spawn. Each
/// task writes a single outcome to `sink` and then reports done through a drop guard, so
/// the report happens on every path (success, failure, panic, abort) and always after
/// the write. `sink` must have room for every outcome; the tasks never wait on a slow
/// reader beyond that.
///
/// The returned [`JoinSet`] owns the tasks: dropping it aborts anything still running.
pub fn dispatch<P, F>(
    parents: &[P],
    fetcher: Arc<F>,
    sink: mpsc::Sender<Outcome<F::Child>>,
    tracker: &CompletionTracker,
) -> Result<JoinSet<()>>
where
    P: Record,
    F: ResourceFetcher,
{
    tracker.register(parents.len())?;

    let mut tasks = JoinSet::new();
    for parent in parents {
        let parent_id = parent.id();
        let guard = tracker.guard();
        let fetcher = Arc::clone(&fetcher);
        let sink = sink.clone();

        tracing::debug!(parent_id = parent_id.0, "dispatching fetch");
        tasks.spawn(async move {
            let outcome = fetch_outcome(fetcher.as_ref(), parent_id).await;
            if sink.send(outcome).await.is_err() {
                tracing::warn!(
                    parent_id = parent_id.0,
                    "outcome receiver dropped before the outcome was delivered"
                );
            }
            drop(guard);
        });
    }

    Ok(tasks)
}

/// Run one fetch and tag its result with the spawning parent.
///
/// A panicking fetcher is reported as a failed outcome rather than tearing down the task.
async fn fetch_outcome<F: ResourceFetcher>(
    fetcher: &F,
    parent_id: ParentId,
) -> Outcome<F::Child> {
    let result = match AssertUnwindSafe(fetcher.fetch(parent_id))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => {
            tracing::error!(parent_id = parent_id.0, "fetcher panicked");
            Err(FetchError::panicked(parent_id, payload.as_ref()))
        }
    };

    match &result {
        Ok(children) => {
            tracing::debug!(parent_id = parent_id.0, children = children.len(), "fetch succeeded");
        }
        Err(e) => {
            tracing::warn!(parent_id = parent_id.0, error = %e, "fetch failed");
        }
    }

    Outcome::from_result(parent_id, result)
}
