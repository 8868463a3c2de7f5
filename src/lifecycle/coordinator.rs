//! Lifecycle coordinator: registration plus the blocking run.
//!
//! # Responsibilities
//! - Own the signal subscription for the lifetime of one run
//! - Start registered workers together and join them all
//! - Enter the shutdown phase exactly once, on first worker error or signal
//! - Return the single terminal error of the whole lifecycle
//!
//! # Design Decisions
//! - `run(self)` consumes the coordinator, so registration and configuration
//!   are structurally impossible once the run begins; no locks anywhere
//! - The shutdown driver is spawned into the same group as the workers, so
//!   the join covers both phases
//! - Setters normalize invalid values to defaults instead of failing

use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::lifecycle::shutdown::{self, Hook};
use crate::lifecycle::signals::SignalWatcher;
use crate::lifecycle::task_group::TaskGroup;
use crate::BoxError;

/// Default overall budget for the shutdown phase.
pub const DEFAULT_MAX_SHUTDOWN_TIME: Duration = Duration::from_secs(10);

/// Default number of hooks admitted into execution at once.
pub const DEFAULT_MAX_CONCURRENT_HOOKS: usize = 5;

type WorkerFn =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// Tunables snapshot applied to the shutdown phase.
#[derive(Debug, Clone)]
pub struct ShutdownPolicy {
    pub max_shutdown_time: Duration,
    pub max_concurrent_hooks: usize,
    pub cancel_on_error: bool,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            max_shutdown_time: DEFAULT_MAX_SHUTDOWN_TIME,
            max_concurrent_hooks: DEFAULT_MAX_CONCURRENT_HOOKS,
            cancel_on_error: false,
        }
    }
}

/// Coordinates workers, termination signals and shutdown hooks.
///
/// Registration must complete before [`Coordinator::run`] is invoked; the
/// consuming signature enforces that ordering at compile time.
pub struct Coordinator {
    watcher: SignalWatcher,
    workers: Vec<WorkerFn>,
    hooks: Vec<Hook>,
    policy: ShutdownPolicy,
}

impl Coordinator {
    /// Create a coordinator subscribed to SIGINT, SIGTERM and SIGHUP.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Like [`Coordinator::new`], but parented to an external token.
    /// Cancelling `parent` behaves exactly like signal delivery.
    pub fn with_token(parent: CancellationToken) -> Self {
        Self {
            watcher: SignalWatcher::subscribe(parent),
            workers: Vec::new(),
            hooks: Vec::new(),
            policy: ShutdownPolicy::default(),
        }
    }

    /// Set the shared wall-clock budget for the whole shutdown phase.
    /// A zero duration resets to the 10s default.
    pub fn set_max_shutdown_time(&mut self, budget: Duration) {
        self.policy.max_shutdown_time = if budget.is_zero() {
            DEFAULT_MAX_SHUTDOWN_TIME
        } else {
            budget
        };
    }

    pub fn max_shutdown_time(&self) -> Duration {
        self.policy.max_shutdown_time
    }

    /// Set how many hooks may execute at once. Zero resets to the default
    /// of 5.
    pub fn set_max_concurrent_hooks(&mut self, cap: usize) {
        self.policy.max_concurrent_hooks = if cap == 0 {
            DEFAULT_MAX_CONCURRENT_HOOKS
        } else {
            cap
        };
    }

    pub fn max_concurrent_hooks(&self) -> usize {
        self.policy.max_concurrent_hooks
    }

    /// When enabled, the first hook failure cancels the shutdown-scoped
    /// token and becomes the run's returned error. Off by default.
    pub fn set_cancel_on_error(&mut self, cancel: bool) {
        self.policy.cancel_on_error = cancel;
    }

    pub fn cancel_on_error(&self) -> bool {
        self.policy.cancel_on_error
    }

    /// Register a primary worker. The token passed at start is the shared
    /// run token; workers implementing cooperative cancellation should
    /// observe it.
    pub fn register_worker<F, Fut>(&mut self, worker: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.workers
            .push(Box::new(move |token| Box::pin(worker(token))));
    }

    /// Register a cleanup hook invoked once during the shutdown phase with
    /// the shutdown-scoped token. An empty tag resolves to a positional
    /// label at execution time; non-empty tags are used verbatim.
    pub fn register_shutdown_hook<F, Fut>(&mut self, tag: impl Into<String>, hook: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.hooks.push(Hook {
            tag: tag.into(),
            task: Box::new(move |token| Box::pin(hook(token))),
        });
    }

    /// Blocking entry point: start every worker, wait for the termination
    /// trigger (first worker error or signal), drain the shutdown hooks,
    /// and return the first qualifying error.
    ///
    /// A worker that never observes the shared token keeps this call from
    /// returning; cancellation is cooperative by design.
    pub async fn run(self) -> Result<(), BoxError> {
        let Self {
            watcher,
            workers,
            hooks,
            policy,
        } = self;

        // Cancelled by the watcher (signal) or by the first worker error.
        let run_token = watcher.token().child_token();
        let mut group = TaskGroup::new(run_token.clone());

        info!(
            workers = workers.len(),
            hooks = hooks.len(),
            "lifecycle run started"
        );

        for worker in workers {
            group.spawn(worker(run_token.clone()));
        }

        // The shutdown driver joins the same group, so the overall wait does
        // not complete before the shutdown phase does.
        let trigger = run_token.clone();
        group.spawn(async move {
            trigger.cancelled().await;
            info!("termination trigger observed, entering shutdown");
            shutdown::execute(hooks, &policy).await
        });

        let outcome = group.wait().await;
        watcher.release();

        match outcome {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
