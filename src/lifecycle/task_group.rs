//! Reusable fork-join task group.
//!
//! # Responsibilities
//! - Run a set of fallible tasks concurrently and join them all
//! - Cancel a shared token on the first failure (fail-fast)
//! - Capture the first error; discard the rest
//! - Optionally gate admission through a concurrency cap
//!
//! # Design Decisions
//! - One abstraction serves both the worker phase (unbounded) and the
//!   shutdown phase (bounded + deadline)
//! - The deadline wait detaches stragglers instead of aborting them:
//!   cancellation stays cooperative, results of late tasks are ignored
//! - A task still queued for an admission slot when the group is cancelled
//!   is skipped, not started

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::BoxError;

/// Fork-join group with first-error-wins semantics.
pub struct TaskGroup {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    slots: Option<Arc<Semaphore>>,
    first_error: Arc<Mutex<Option<BoxError>>>,
}

impl TaskGroup {
    /// Create an unbounded group tied to the given cancellation token.
    pub fn new(cancel: CancellationToken) -> Self {
        Self::build(cancel, None)
    }

    /// Create a group that admits at most `limit` tasks into execution at
    /// any instant. A zero limit is treated as 1.
    pub fn with_limit(cancel: CancellationToken, limit: usize) -> Self {
        Self::build(cancel, Some(Arc::new(Semaphore::new(limit.max(1)))))
    }

    fn build(cancel: CancellationToken, slots: Option<Arc<Semaphore>>) -> Self {
        Self {
            cancel,
            tasks: JoinSet::new(),
            slots,
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// The token cancelled when the first task fails.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Schedule a task. Never blocks the caller: with a limit configured the
    /// task itself waits for an admission slot.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let slots = self.slots.clone();
        let first_error = Arc::clone(&self.first_error);

        self.tasks.spawn(async move {
            let _permit = match slots {
                Some(semaphore) => {
                    tokio::select! {
                        permit = semaphore.acquire_owned() => match permit {
                            Ok(permit) => Some(permit),
                            Err(_) => return,
                        },
                        _ = cancel.cancelled() => {
                            debug!("group cancelled while task queued for a slot, skipping");
                            return;
                        }
                    }
                }
                None => None,
            };

            if let Err(err) = task.await {
                record_first(&first_error, &cancel, err);
            }
        });
    }

    /// Join every task, then return the first captured error, if any.
    pub async fn wait(mut self) -> Option<BoxError> {
        while let Some(joined) = self.tasks.join_next().await {
            Self::note_join(&self.first_error, &self.cancel, joined);
        }
        take_error(&self.first_error)
    }

    /// Join tasks until `budget` elapses. On expiry the group token is
    /// cancelled and remaining tasks are detached; their eventual results
    /// are ignored. Returns whatever error was captured before the cutoff.
    pub async fn wait_timeout(mut self, budget: Duration) -> Option<BoxError> {
        let tasks = &mut self.tasks;
        let first_error = &self.first_error;
        let cancel = &self.cancel;

        let drained = tokio::time::timeout(budget, async {
            while let Some(joined) = tasks.join_next().await {
                Self::note_join(first_error, cancel, joined);
            }
        })
        .await;

        if drained.is_err() {
            self.cancel.cancel();
            let abandoned = self.tasks.len();
            self.tasks.detach_all();
            warn!(abandoned, "deadline elapsed, abandoning unfinished tasks");
        }

        take_error(&self.first_error)
    }

    fn note_join(
        first_error: &Mutex<Option<BoxError>>,
        cancel: &CancellationToken,
        joined: Result<(), tokio::task::JoinError>,
    ) {
        if let Err(join_err) = joined {
            if join_err.is_panic() {
                record_first(first_error, cancel, Box::new(join_err));
            }
        }
    }
}

fn record_first(slot: &Mutex<Option<BoxError>>, cancel: &CancellationToken, err: BoxError) {
    // Poisoning can only come from a panic inside this short critical section.
    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.is_none() {
        *guard = Some(err);
        cancel.cancel();
    }
}

fn take_error(slot: &Mutex<Option<BoxError>>) -> Option<BoxError> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take()
}
