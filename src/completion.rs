//! Completion tracking for fan-out work.
//!
//! A [`CompletionTracker`] counts outstanding tasks and latches a terminal "all done"
//! state exactly once, on the transition to zero. The count lives in a
//! `tokio::sync::watch` channel, so every update is serialized under the channel's lock
//! and the terminal state becomes visible in the same critical section as the last
//! decrement. Waiters can never observe completion ahead of that decrement.

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TrackerState {
    outstanding: usize,
    fired: bool,
}

/// Counts outstanding tasks and signals once when they have all reported.
///
/// Cheap to clone; all clones share the same counter.
#[derive(Clone, Debug)]
pub struct CompletionTracker {
    state: Arc<watch::Sender<TrackerState>>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    /// Create a tracker with nothing outstanding.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TrackerState::default());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Record `n` more outstanding tasks.
    ///
    /// Fails once the terminal signal has fired: a fired tracker never re-arms.
    pub fn register(&self, n: usize) -> Result<()> {
        let mut rejected = false;
        self.state.send_if_modified(|state| {
            if state.fired {
                rejected = true;
                return false;
            }
            if n == 0 {
                return false;
            }
            state.outstanding += n;
            true
        });

        if rejected {
            return Err(Error::Completion(format!(
                "cannot register {} task(s): completion already signalled",
                n
            )));
        }
        Ok(())
    }

    /// Mark one task as finished. Safe to call concurrently from any task.
    ///
    /// The call that brings the count to zero fires the terminal signal.
    pub fn task_done(&self) {
        self.state.send_if_modified(|state| match state.outstanding.checked_sub(1) {
            Some(remaining) => {
                state.outstanding = remaining;
                if remaining == 0 {
                    state.fired = true;
                }
                true
            }
            None => {
                tracing::warn!("task_done called with no outstanding tasks");
                false
            }
        });
    }

    /// A guard that calls [`task_done`](Self::task_done) when dropped.
    ///
    /// Does not register anything itself; pair it with a unit already counted by
    /// [`register`](Self::register).
    pub fn guard(&self) -> TaskGuard {
        TaskGuard {
            tracker: self.clone(),
        }
    }

    /// Number of tasks registered but not yet finished
    pub fn outstanding(&self) -> usize {
        self.state.borrow().outstanding
    }

    /// Whether the terminal signal has fired
    pub fn is_fired(&self) -> bool {
        self.state.borrow().fired
    }

    /// The one-shot completion signal.
    ///
    /// Call after all work has been registered. If nothing is outstanding at this point
    /// the signal fires immediately, which is how zero dispatched tasks complete.
    pub fn done(&self) -> Completion {
        self.state.send_if_modified(|state| {
            if state.outstanding == 0 && !state.fired {
                state.fired = true;
                return true;
            }
            false
        });
        Completion {
            rx: self.state.subscribe(),
        }
    }
}

/// Handle to a tracker's terminal signal
#[derive(Debug)]
pub struct Completion {
    rx: watch::Receiver<TrackerState>,
}

impl Completion {
    /// Whether the signal has already fired
    pub fn is_fired(&self) -> bool {
        self.rx.borrow().fired
    }

    /// Wait until every registered task has finished.
    ///
    /// Errors if every tracker handle is dropped while tasks are still outstanding,
    /// which only happens when workers are torn down without finishing.
    pub async fn wait(mut self) -> Result<()> {
        self.rx
            .wait_for(|state| state.fired)
            .await
            .map(|_| ())
            .map_err(|_| {
                Error::Completion("tracker dropped with tasks still outstanding".to_string())
            })
    }
}

/// Calls [`CompletionTracker::task_done`] exactly once, on drop.
#[must_use = "dropping the guard immediately marks the task as done"]
#[derive(Debug)]
pub struct TaskGuard {
    tracker: CompletionTracker,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.task_done();
    }
}
