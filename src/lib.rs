//! # fanfold
//!
//! Concurrent fan-out/fan-in aggregation: given a set of parent records, fetch every
//! parent's sub-resource concurrently and reassemble the results into a
//! parent → children structure once all fetches have reported.
//!
//! ## Design Philosophy
//!
//! - **Every parent accounted for** - each parent ends up with children, an empty
//!   children list, or a recorded error; none is dropped
//! - **Partial failure is data** - one failed fetch is recorded under its parent and
//!   never stalls or aborts the others
//! - **Single owner** - the result map is built by one drain task and handed over only
//!   when complete
//! - **Library-first** - the engine returns data; printing and process control belong
//!   to the caller
//!
//! ## Quick Start
//!
//! ```no_run
//! use fanfold::{Config, FanOut, HttpSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = HttpSource::new(config.source.clone())?;
//!     let fan_out = FanOut::new(source.clone());
//!
//!     let result = fan_out.run(&source).await?;
//!     for (post_id, error) in result.errors() {
//!         eprintln!("post {}: {}", post_id, error.message);
//!     }
//!     println!("{} posts, {} comments", result.len(), result.total_children());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Completion tracking for dispatched work
pub mod completion;
/// Configuration types
pub mod config;
/// Fan-out/fan-in engine
pub mod engine;
/// Error types
pub mod error;
/// Collaborator traits (listing, per-parent fetch)
pub mod fetcher;
/// HTTP collaborators
pub mod source;
/// Core types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use completion::{Completion, CompletionTracker, TaskGuard};
pub use config::{Config, EngineConfig, SourceConfig};
pub use engine::FanOut;
pub use error::{Error, FetchError, Result};
pub use fetcher::{BlockingFetcher, ListingSource, ResourceFetcher};
pub use source::HttpSource;
pub use types::{
    AggregateResult, AggregateStats, ChildRecord, Comment, EntryStatus, Outcome, ParentEntry,
    ParentId, Post, PostWithComments, Record,
};

/// Fetch every post and its comments from the configured source.
///
/// The listing is fetched once; a failure there is returned as [`Error::Listing`] and
/// no comment fetch is started. Per-post comment failures are recorded in the
/// result's error map.
///
/// # Example
///
/// ```no_run
/// use fanfold::{Config, fetch_posts_with_comments};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let result = fetch_posts_with_comments(&Config::default()).await?;
///     println!("{} comments gathered", result.total_children());
///     Ok(())
/// }
/// ```
pub async fn fetch_posts_with_comments(config: &Config) -> Result<AggregateResult<Post, Comment>> {
    config.validate()?;
    let source = Arc::new(HttpSource::new(config.source.clone())?);
    let fan_out = FanOut::with_config(Arc::clone(&source), config.engine.clone());
    fan_out.run(source.as_ref()).await
}
