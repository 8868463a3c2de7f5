//! Integration tests for the lifecycle coordinator.
//!
//! Real signals would hit the whole test binary, so these tests drive the
//! coordinator through `with_token`: cancelling the parent token is defined
//! to behave exactly like signal delivery.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use quiesce::{BoxError, Coordinator};

#[tokio::test]
async fn run_returns_ok_after_signal_when_all_workers_succeed() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());

    coordinator.register_worker(|_run| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<(), BoxError>(())
    });
    coordinator.register_worker(|_run| async { Ok::<(), BoxError>(()) });

    let hook_done = Arc::new(AtomicBool::new(false));
    let done = hook_done.clone();
    coordinator.register_shutdown_hook("db", move |_shutdown| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        done.store(true, Ordering::SeqCst);
        Ok::<(), BoxError>(())
    });

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        parent.cancel();
    });

    let started = Instant::now();
    coordinator.run().await.unwrap();

    assert!(hook_done.load(Ordering::SeqCst));
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn first_worker_error_is_returned_and_every_hook_runs_once() {
    let mut coordinator = Coordinator::new();

    coordinator.register_worker(|_run| async { Err::<(), BoxError>("boom".into()) });
    coordinator.register_worker(|run| async move {
        run.cancelled().await;
        Ok::<(), BoxError>(())
    });
    // A later failure must be discarded under first-error-wins.
    coordinator.register_worker(|_run| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err::<(), BoxError>("later".into())
    });

    let hook_calls = Arc::new(AtomicU32::new(0));
    for tag in ["db", "cache"] {
        let calls = hook_calls.clone();
        coordinator.register_shutdown_hook(tag, move |_shutdown| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<(), BoxError>(())
        });
    }

    let err = coordinator.run().await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn immediately_returning_worker_and_hook_are_harmless() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());

    coordinator.register_worker(|_run| async { Ok::<(), BoxError>(()) });
    coordinator.register_shutdown_hook("", |_shutdown| async { Ok::<(), BoxError>(()) });

    parent.cancel();
    coordinator.run().await.unwrap();
}

#[tokio::test]
async fn hook_concurrency_is_bounded_by_the_configured_cap() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());
    coordinator.set_max_concurrent_hooks(2);

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    for _ in 0..6 {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        coordinator.register_shutdown_hook("", move |_shutdown| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok::<(), BoxError>(())
        });
    }

    parent.cancel();
    let started = Instant::now();
    coordinator.run().await.unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
    // ceil(6 hooks / cap 2) waves of 50ms each.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn zero_hooks_shutdown_completes_with_negligible_latency() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());

    coordinator.register_worker(|run| async move {
        run.cancelled().await;
        Ok::<(), BoxError>(())
    });

    parent.cancel();
    let started = Instant::now();
    coordinator.run().await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn hook_failure_is_absorbed_by_default() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());

    let second_ran = Arc::new(AtomicBool::new(false));
    coordinator.register_shutdown_hook("failing", |_shutdown| async {
        Err::<(), BoxError>("cleanup failed".into())
    });
    let ran = second_ran.clone();
    coordinator.register_shutdown_hook("healthy", move |_shutdown| async move {
        ran.store(true, Ordering::SeqCst);
        Ok::<(), BoxError>(())
    });

    parent.cancel();
    coordinator.run().await.unwrap();
    assert!(second_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cancel_on_error_propagates_first_hook_failure_and_cancels_the_rest() {
    let parent = CancellationToken::new();
    let mut coordinator = Coordinator::with_token(parent.clone());
    coordinator.set_cancel_on_error(true);

    coordinator.register_shutdown_hook("failing", |_shutdown| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err::<(), BoxError>("cleanup failed".into())
    });

    let aborted_early = Arc::new(AtomicBool::new(false));
    let aborted = aborted_early.clone();
    coordinator.register_shutdown_hook("cooperative", move |shutdown| async move {
        tokio::select! {
            _ = shutdown.cancelled() => aborted.store(true, Ordering::SeqCst),
            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
        }
        Ok::<(), BoxError>(())
    });

    parent.cancel();
    let started = Instant::now();
    let err = coordinator.run().await.unwrap_err();

    assert_eq!(err.to_string(), "cleanup failed");
    assert!(aborted_early.load(Ordering::SeqCst));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn slow_hook_is_abandoned_at_the_shutdown_deadline() {
    let mut coordinator = Coordinator::new();
    coordinator.set_max_shutdown_time(Duration::from_millis(200));

    coordinator.register_worker(|_run| async { Err::<(), BoxError>("fatal".into()) });
    // Sleeps straight through the budget without observing the token.
    coordinator.register_shutdown_hook("sleeper", |_shutdown| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<(), BoxError>(())
    });

    let started = Instant::now();
    let err = coordinator.run().await.unwrap_err();

    assert_eq!(err.to_string(), "fatal");
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn worker_error_takes_precedence_over_hook_error() {
    let mut coordinator = Coordinator::new();
    coordinator.set_cancel_on_error(true);

    coordinator.register_worker(|_run| async { Err::<(), BoxError>("worker down".into()) });
    coordinator.register_shutdown_hook("failing", |_shutdown| async {
        Err::<(), BoxError>("cleanup failed".into())
    });

    let err = coordinator.run().await.unwrap_err();
    assert_eq!(err.to_string(), "worker down");
}
