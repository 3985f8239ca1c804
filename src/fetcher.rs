//! Collaborator seams: the parent listing and the per-parent resource fetch.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{FetchError, Result};
use crate::types::{ParentId, Record};

/// Fetches the sub-resource of one parent.
///
/// Implementations must be safe to call concurrently, for different ids and for the
/// same id, and must not share mutable state between calls. Failures are returned, not
/// retried; the fan-out layer only records them.
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync + 'static {
    /// Item type produced per parent
    type Child: Send + 'static;

    /// Fetch all children of `parent_id`.
    async fn fetch(&self, parent_id: ParentId) -> std::result::Result<Vec<Self::Child>, FetchError>;
}

#[async_trait::async_trait]
impl<F: ResourceFetcher> ResourceFetcher for Arc<F> {
    type Child = F::Child;

    async fn fetch(&self, parent_id: ParentId) -> std::result::Result<Vec<Self::Child>, FetchError> {
        self.as_ref().fetch(parent_id).await
    }
}

/// Produces the parent records that seed a run.
///
/// A failure here is fatal: no fan-out starts.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    /// Parent record type
    type Parent: Record;

    /// Fetch every parent record.
    async fn fetch_parents(&self) -> Result<Vec<Self::Parent>>;
}

/// [`ResourceFetcher`] over a synchronous, blocking function.
///
/// Each call runs on tokio's blocking pool so the function may block on I/O without
/// stalling the runtime.
pub struct BlockingFetcher<F, C> {
    func: Arc<F>,
    _child: PhantomData<fn() -> C>,
}

impl<F, C> BlockingFetcher<F, C>
where
    F: Fn(ParentId) -> std::result::Result<Vec<C>, FetchError> + Send + Sync + 'static,
    C: Send + 'static,
{
    /// Wrap a blocking fetch function.
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
            _child: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<F, C> ResourceFetcher for BlockingFetcher<F, C>
where
    F: Fn(ParentId) -> std::result::Result<Vec<C>, FetchError> + Send + Sync + 'static,
    C: Send + 'static,
{
    type Child = C;

    async fn fetch(&self, parent_id: ParentId) -> std::result::Result<Vec<C>, FetchError> {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func(parent_id))
            .await
            .unwrap_or_else(|e| match e.try_into_panic() {
                Ok(payload) => Err(FetchError::panicked(parent_id, payload.as_ref())),
                Err(e) => Err(FetchError::new(
                    parent_id,
                    format!("blocking fetch task failed: {}", e),
                )),
            })
    }
}
