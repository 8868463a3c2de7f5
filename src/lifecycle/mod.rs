//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (coordinator.rs):
//!     register workers + shutdown hooks → configure limits → run()
//!
//! Run (coordinator.rs + task_group.rs):
//!     workers start together → first error cancels shared token
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP → cancel shared token
//!
//! Shutdown (shutdown.rs):
//!     shared token cancelled → hooks drain, bounded + deadlined → exit
//! ```
//!
//! # Design Decisions
//! - Exactly one shutdown transition, never re-entrant
//! - All cancellation is cooperative: tokens notify, nothing is killed
//! - One fork-join abstraction (task_group.rs) serves both phases

pub mod coordinator;
pub(crate) mod shutdown;
pub mod signals;
pub mod task_group;

pub use coordinator::{Coordinator, ShutdownPolicy};
pub use signals::SignalWatcher;
pub use task_group::TaskGroup;
