//! Fan-in: a single consumer that drains outcomes into the keyed result.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::completion::Completion;
use crate::error::FetchError;
use crate::types::{AggregateResult, AggregateStats, Outcome, ParentEntry, ParentId, Record};

/// Single-owner state of one drain. Nothing else reads or writes it until it is frozen.
struct Drain<P, C> {
    entries: BTreeMap<ParentId, ParentEntry<P, C>>,
    errors: BTreeMap<ParentId, FetchError>,
    order: Vec<ParentId>,
    reported: HashSet<ParentId>,
    outcomes: usize,
}

impl<P: Record, C> Drain<P, C> {
    /// Pre-populate one empty entry per parent so every known parent shows up in the
    /// result, whatever its fetch does.
    fn new(parents: Vec<P>) -> Self {
        let mut entries = BTreeMap::new();
        let mut order = Vec::with_capacity(parents.len());
        for parent in parents {
            let id = parent.id();
            if entries.contains_key(&id) {
                continue;
            }
            order.push(id);
            entries.insert(
                id,
                ParentEntry {
                    parent,
                    children: Vec::new(),
                },
            );
        }
        Self {
            entries,
            errors: BTreeMap::new(),
            order,
            reported: HashSet::new(),
            outcomes: 0,
        }
    }

    fn merge(&mut self, outcome: Outcome<C>) {
        let parent_id = outcome.parent_id();
        let Some(entry) = self.entries.get_mut(&parent_id) else {
            tracing::warn!(parent_id = parent_id.0, "discarding outcome for unknown parent");
            return;
        };
        self.outcomes += 1;
        self.reported.insert(parent_id);

        match outcome {
            Outcome::Children { children, .. } => {
                if self.errors.contains_key(&parent_id) {
                    tracing::debug!(
                        parent_id = parent_id.0,
                        children = children.len(),
                        "dropping children of a parent already marked failed"
                    );
                    return;
                }
                tracing::debug!(
                    parent_id = parent_id.0,
                    children = children.len(),
                    "merged outcome"
                );
                entry.children.extend(children);
            }
            Outcome::Failed(err) => {
                tracing::debug!(parent_id = parent_id.0, error = %err, "recorded failed outcome");
                entry.children.clear();
                self.errors.entry(parent_id).or_insert(err);
            }
        }
    }

    /// Record a failure for every parent that never reported, so none is dropped silently.
    fn account_for_silent_parents(&mut self) {
        for id in &self.order {
            if !self.reported.contains(id) && !self.errors.contains_key(id) {
                tracing::error!(parent_id = id.0, "no outcome received for parent");
                self.errors
                    .insert(*id, FetchError::new(*id, "no outcome received"));
            }
        }
    }

    fn freeze(mut self, started: Instant) -> AggregateResult<P, C> {
        self.account_for_silent_parents();

        let failed = self.errors.len();
        let stats = AggregateStats {
            reported: self.outcomes,
            succeeded: self.entries.len().saturating_sub(failed),
            failed,
            children: self.entries.values().map(|e| e.children.len()).sum(),
            elapsed: started.elapsed(),
        };
        AggregateResult::new(self.entries, self.errors, self.order, stats)
    }
}

/// Drain `outcomes` until `completion` fires, then return the frozen result.
///
/// The result holds one entry per distinct parent id, pre-populated before the first
/// outcome is read. Successful outcomes append their children to the entry and failed
/// ones are recorded in the error map. When several outcomes share an id, any failure
/// wins: the entry's children are cleared and the first error is kept, whatever the
/// arrival order.
///
/// Completion only ends the loop after the channel has been closed and emptied: every
/// task writes its outcome before it reports done, so once the signal is observed the
/// remaining outcomes are all buffered and are read before returning. The loop also ends
/// when every sender is gone.
pub async fn aggregate<P, C>(
    parents: Vec<P>,
    mut outcomes: mpsc::Receiver<Outcome<C>>,
    completion: Completion,
) -> AggregateResult<P, C>
where
    P: Record,
{
    let started = Instant::now();
    let mut drain = Drain::new(parents);

    let signal = completion.wait();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            biased;

            next = outcomes.recv() => match next {
                Some(outcome) => drain.merge(outcome),
                None => break,
            },
            fired = &mut signal => {
                if let Err(e) = fired {
                    tracing::error!(error = %e, "completion signal lost, draining what was delivered");
                }
                outcomes.close();
                while let Some(outcome) = outcomes.recv().await {
                    drain.merge(outcome);
                }
                break;
            }
        }
    }

    drain.freeze(started)
}
