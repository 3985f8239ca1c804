//! Core types for fanfold

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::FetchError;

/// Identifier of a parent record; the key of every aggregate entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(pub i64);

impl ParentId {
    /// Create a new ParentId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ParentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ParentId> for i64 {
    fn from(id: ParentId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for ParentId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ParentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ParentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A parent record that seeds the fan-out.
///
/// Read-only for the duration of a run; only its id is handed to workers.
pub trait Record: Send + Sync + 'static {
    /// The key this record is aggregated under
    fn id(&self) -> ParentId;
}

/// A child item that knows which parent it belongs to.
pub trait ChildRecord {
    /// The parent this item was fetched for
    fn parent_id(&self) -> ParentId;
}

/// Outcome of one dispatched fetch task.
///
/// Exactly one outcome is produced per dispatched parent. Completion counting relies on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<C> {
    /// The fetch succeeded (possibly with zero children)
    Children {
        /// The parent that spawned the task
        parent_id: ParentId,
        /// Children returned by the fetcher, in fetcher order
        children: Vec<C>,
    },
    /// The fetch failed
    Failed(FetchError),
}

impl<C> Outcome<C> {
    /// Tag a fetcher result with the parent that produced it.
    ///
    /// The error is re-tagged with `parent_id` so an outcome can never be attributed
    /// to a different parent than the one whose task produced it.
    pub fn from_result(parent_id: ParentId, result: Result<Vec<C>, FetchError>) -> Self {
        match result {
            Ok(children) => Outcome::Children {
                parent_id,
                children,
            },
            Err(err) => Outcome::Failed(FetchError { parent_id, ..err }),
        }
    }

    /// The parent this outcome belongs to
    pub fn parent_id(&self) -> ParentId {
        match self {
            Outcome::Children { parent_id, .. } => *parent_id,
            Outcome::Failed(err) => err.parent_id,
        }
    }

    /// Whether this outcome is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// One parent with the children gathered for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentEntry<P, C> {
    /// The parent record, as returned by the listing
    pub parent: P,
    /// Children merged from the parent's outcome(s)
    pub children: Vec<C>,
}

/// How a parent ended up in the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// The fetch succeeded and returned this many children (> 0)
    Populated(usize),
    /// The fetch succeeded and legitimately returned no children
    Empty,
    /// The fetch failed; see [`AggregateResult::error`]
    Failed,
}

/// Summary counters for one aggregation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Number of outcomes received (one per dispatched task)
    pub reported: usize,
    /// Number of parents whose fetch succeeded
    pub succeeded: usize,
    /// Number of parents whose fetch failed
    pub failed: usize,
    /// Total children across all parents
    pub children: usize,
    /// Wall-clock time of the drain
    pub elapsed: Duration,
}

/// Final, frozen result of an aggregation run.
///
/// Every dispatched parent appears in [`entries`](Self::entries). Parents whose fetch
/// failed additionally appear in [`errors`](Self::errors) and have no children, so
/// callers can tell "no children" from "fetch failed".
#[derive(Debug, Clone)]
pub struct AggregateResult<P, C> {
    entries: BTreeMap<ParentId, ParentEntry<P, C>>,
    errors: BTreeMap<ParentId, FetchError>,
    order: Vec<ParentId>,
    stats: AggregateStats,
}

impl<P, C> AggregateResult<P, C> {
    pub(crate) fn new(
        entries: BTreeMap<ParentId, ParentEntry<P, C>>,
        errors: BTreeMap<ParentId, FetchError>,
        order: Vec<ParentId>,
        stats: AggregateStats,
    ) -> Self {
        Self {
            entries,
            errors,
            order,
            stats,
        }
    }

    /// All parents keyed by id
    pub fn entries(&self) -> &BTreeMap<ParentId, ParentEntry<P, C>> {
        &self.entries
    }

    /// Recorded fetch failures keyed by parent id
    pub fn errors(&self) -> &BTreeMap<ParentId, FetchError> {
        &self.errors
    }

    /// Entry for one parent
    pub fn get(&self, id: ParentId) -> Option<&ParentEntry<P, C>> {
        self.entries.get(&id)
    }

    /// Children gathered for one parent
    pub fn children(&self, id: ParentId) -> Option<&[C]> {
        self.entries.get(&id).map(|e| e.children.as_slice())
    }

    /// Recorded failure for one parent
    pub fn error(&self, id: ParentId) -> Option<&FetchError> {
        self.errors.get(&id)
    }

    /// Classify how a parent ended up in the result, `None` for unknown ids.
    pub fn status(&self, id: ParentId) -> Option<EntryStatus> {
        let entry = self.entries.get(&id)?;
        if self.errors.contains_key(&id) {
            return Some(EntryStatus::Failed);
        }
        Some(match entry.children.len() {
            0 => EntryStatus::Empty,
            n => EntryStatus::Populated(n),
        })
    }

    /// Number of parents in the result
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the run had no parents at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of children across every parent
    pub fn total_children(&self) -> usize {
        self.entries.values().map(|e| e.children.len()).sum()
    }

    /// True when no fetch failed
    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Run statistics
    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Consume the result, yielding entries in the order the parents were listed.
    pub fn into_ordered(mut self) -> Vec<ParentEntry<P, C>> {
        self.order
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect()
    }

    /// Consume the result into its entry and error maps.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<ParentId, ParentEntry<P, C>>,
        BTreeMap<ParentId, FetchError>,
    ) {
        (self.entries, self.errors)
    }
}

/// A post from a JSONPlaceholder-compatible API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Author id
    pub user_id: i64,
    /// Post id
    pub id: i64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

impl Record for Post {
    fn id(&self) -> ParentId {
        ParentId(self.id)
    }
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// The post this comment belongs to
    pub post_id: i64,
    /// Comment id
    pub id: i64,
    /// Commenter name
    pub name: String,
    /// Commenter email
    pub email: String,
    /// Body text
    pub body: String,
}

impl ChildRecord for Comment {
    fn parent_id(&self) -> ParentId {
        ParentId(self.post_id)
    }
}

/// A post together with its comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithComments {
    /// The post
    #[serde(flatten)]
    pub post: Post,
    /// Comments gathered for the post
    pub comments: Vec<Comment>,
}

impl From<ParentEntry<Post, Comment>> for PostWithComments {
    fn from(entry: ParentEntry<Post, Comment>) -> Self {
        Self {
            post: entry.parent,
            comments: entry.children,
        }
    }
}
