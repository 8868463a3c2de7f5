//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Shutdown phase tunables.
    pub shutdown: ShutdownConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Application name used in logs.
    pub app_name: String,

    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "quiesce".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Shutdown phase tunables.
///
/// Non-positive values are normalized to defaults by the coordinator's
/// setters, never rejected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Shared wall-clock budget for all hooks together, in seconds.
    pub max_shutdown_time_secs: u64,

    /// Maximum hooks admitted into execution at any instant.
    pub max_concurrent_hooks: usize,

    /// Propagate the first hook failure as the run's returned error.
    pub cancel_on_error: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            max_shutdown_time_secs: 10,
            max_concurrent_hooks: 5,
            cancel_on_error: false,
        }
    }
}

impl ShutdownConfig {
    pub fn max_shutdown_time(&self) -> Duration {
        Duration::from_secs(self.max_shutdown_time_secs)
    }
}
