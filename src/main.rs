//! REST service entry point.
//!
//! Wires the demo routes into the lifecycle-coordinated server: the listener
//! runs as a worker, its stop call as a shutdown hook, and termination
//! signals drain everything under the configured budget.

use std::path::PathBuf;
use std::process::ExitCode;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;

use quiesce::config::{self, AppConfig};
use quiesce::observability::logging;
use quiesce::server::RestApp;

#[derive(Parser, Debug)]
#[command(name = "quiesce", about = "REST service with graceful lifecycle coordination")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    logging::init("quiesce=debug,axum=info");

    let mut config = match &args.config {
        Some(path) => match config::load_config(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %path.display(),
                    "failed to load configuration"
                );
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    tracing::info!(
        app = %config.server.app_name,
        bind_address = %config.server.bind_address,
        max_shutdown_time_secs = config.shutdown.max_shutdown_time_secs,
        max_concurrent_hooks = config.shutdown.max_concurrent_hooks,
        cancel_on_error = config.shutdown.cancel_on_error,
        "configuration loaded"
    );

    let routes = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/healthz", get(healthz));

    let result = RestApp::new(config).router(routes).serve().await;

    match result {
        Ok(()) => {
            tracing::info!("terminated cleanly");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "terminated with error");
            ExitCode::FAILURE
        }
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
