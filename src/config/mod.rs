//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → AppConfig (immutable once loaded)
//!     → server wrapper applies shutdown settings via the coordinator's
//!       normalizing setters
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a minimal (or absent) config file works
//! - Out-of-range shutdown values are not rejected here; the coordinator's
//!   setters normalize them to defaults

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ServerConfig, ShutdownConfig};
