//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT, SIGTERM and SIGHUP
//! - Translate the first delivery into a cancellation token firing once
//! - Release the subscription on every exit path
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - One subscription per coordinator instance, never ambient global state
//! - `release` is idempotent; `Drop` calls it so the listener task and its
//!   handlers can never leak
//! - No distinction between signal kinds: any of them means "terminate"

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Process-wide cancellation source derived from termination signals.
///
/// The token is a child of the caller-supplied parent, so cancelling the
/// parent behaves exactly like signal delivery. Tests lean on this instead
/// of raising real signals.
pub struct SignalWatcher {
    token: CancellationToken,
}

impl SignalWatcher {
    /// Install the signal handlers and spawn the listener task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(parent: CancellationToken) -> Self {
        let token = parent.child_token();
        let trip = token.clone();

        tokio::spawn(async move {
            wait_for_termination(&trip).await;
            trip.cancel();
        });

        Self { token }
    }

    /// Token cancelled on first signal delivery (or on `release`).
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the token and let the listener task exit, dropping its signal
    /// registrations. Safe to call any number of times.
    pub fn release(&self) {
        self.token.cancel();
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(unix)]
async fn wait_for_termination(token: &CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let handlers = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    );

    match handlers {
        (Ok(mut interrupt), Ok(mut terminate), Ok(mut hangup)) => {
            tokio::select! {
                _ = interrupt.recv() => info!(signal = "SIGINT", "termination signal received"),
                _ = terminate.recv() => info!(signal = "SIGTERM", "termination signal received"),
                _ = hangup.recv() => info!(signal = "SIGHUP", "termination signal received"),
                _ = token.cancelled() => {}
            }
        }
        _ => {
            warn!("failed to install unix signal handlers, falling back to ctrl_c");
            wait_for_ctrl_c(token).await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination(token: &CancellationToken) {
    wait_for_ctrl_c(token).await;
}

async fn wait_for_ctrl_c(token: &CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!(signal = "ctrl_c", "termination signal received"),
            Err(err) => warn!(error = %err, "ctrl_c handler failed"),
        },
        _ = token.cancelled() => {}
    }
}
