//! Shutdown phase execution.
//!
//! Runs every registered hook concurrently, admitting at most the configured
//! number into execution at once, under one shared wall-clock budget counted
//! from the moment the phase begins. Hook outcomes are logged per resolved
//! tag; whether a failure propagates is decided by the cancel-on-error
//! policy.

use std::time::Instant;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::lifecycle::coordinator::ShutdownPolicy;
use crate::lifecycle::task_group::TaskGroup;
use crate::BoxError;

pub(crate) type HookFn =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// A registered cleanup task plus its display tag.
pub(crate) struct Hook {
    pub(crate) tag: String,
    pub(crate) task: HookFn,
}

/// Resolve an empty tag to a positional label by registration order.
pub(crate) fn resolve_tag(tag: String, index: usize) -> String {
    if tag.is_empty() {
        format!("process {index}")
    } else {
        tag
    }
}

/// Execute the shutdown phase exactly once.
///
/// Returns `Err` only under cancel-on-error, and then only the first hook
/// failure; everything else is absorbed into logs.
pub(crate) async fn execute(hooks: Vec<Hook>, policy: &ShutdownPolicy) -> Result<(), BoxError> {
    if hooks.is_empty() {
        debug!("no shutdown hooks registered");
        return Ok(());
    }

    let begun = Instant::now();
    info!(
        hooks = hooks.len(),
        budget_ms = policy.max_shutdown_time.as_millis() as u64,
        max_concurrent = policy.max_concurrent_hooks,
        "shutdown phase started"
    );

    let token = CancellationToken::new();
    let mut group = TaskGroup::with_limit(token.clone(), policy.max_concurrent_hooks);
    let cancel_on_error = policy.cancel_on_error;

    for (index, hook) in hooks.into_iter().enumerate() {
        let Hook { tag, task } = hook;
        let tag = resolve_tag(tag, index);
        let hook_token = token.clone();

        group.spawn(async move {
            match task(hook_token).await {
                Ok(()) => {
                    info!(tag = %tag, "shutdown hook finished");
                    Ok(())
                }
                Err(err) if cancel_on_error => {
                    error!(tag = %tag, error = %err, "shutdown hook failed, cancelling remaining hooks");
                    Err(err)
                }
                Err(err) => {
                    error!(tag = %tag, error = %err, "shutdown hook failed");
                    Ok(())
                }
            }
        });
    }

    let outcome = group.wait_timeout(policy.max_shutdown_time).await;
    info!(
        elapsed_ms = begun.elapsed().as_millis() as u64,
        "shutdown phase complete"
    );

    match outcome {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
