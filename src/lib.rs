//! Graceful lifecycle coordination for long-running services.
//!
//! # Architecture Overview
//!
//! ```text
//! SIGINT/SIGTERM/SIGHUP ──▶ signal watcher ──┐
//!                                            ▼
//! workers (serve loops) ──▶ task group ──▶ shared run token
//!                               │   (cancelled by signal OR first error)
//!                               │            │ triggers exactly once
//!                               │            ▼
//! shutdown hooks ───────────────┼──▶ shutdown phase
//! (stop calls)                  │    bounded concurrency, one deadline
//!                               ▼            │
//!                        run() returns ◀─────┘
//!                        the first qualifying error
//! ```
//!
//! The `lifecycle` module is the core: it races a signal watcher against the
//! first worker failure, then drains registered shutdown hooks under a single
//! wall-clock budget. The remaining modules are the host-application shell
//! around it (REST wrapper, configuration, logging).

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use lifecycle::Coordinator;
pub use server::RestApp;

/// Error type reported by workers and shutdown hooks.
///
/// The coordinator never inspects errors beyond logging them; callers supply
/// whatever concrete type their workers produce.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
