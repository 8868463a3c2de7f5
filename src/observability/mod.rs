//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via the tracing crate
//! - Filter configurable through `RUST_LOG`, with a caller-supplied default
//! - Hook and worker outcomes are logged with structured fields (tag, error)
//!   by the lifecycle subsystem; this module only owns initialization

pub mod logging;
