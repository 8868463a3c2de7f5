//! REST server wrapper around the lifecycle coordinator.
//!
//! # Responsibilities
//! - Build the axum router and bind the listener
//! - Register the serve loop as a worker and its stop call as a tagged hook
//! - Register any extra cleanup tasks the host application supplies
//! - Apply the configured shutdown tunables and run to completion
//!
//! # Design Decisions
//! - The wrapper knows nothing about what extra hooks do; it only wires them
//! - The serve loop drains via axum's graceful shutdown, tripped by its own
//!   paired hook so HTTP teardown competes for the same shutdown budget as
//!   every other cleanup task

use std::future::Future;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::lifecycle::Coordinator;
use crate::BoxError;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

type CleanupFn =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// A REST application wired into the lifecycle coordinator.
pub struct RestApp {
    config: AppConfig,
    router: Router,
    on_shutdown: Vec<(String, CleanupFn)>,
}

impl RestApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            on_shutdown: Vec::new(),
        }
    }

    /// Merge application routes into the server.
    pub fn router(mut self, routes: Router) -> Self {
        self.router = self.router.merge(routes);
        self
    }

    /// Register an extra cleanup task run during the shutdown phase.
    pub fn on_shutdown<F, Fut>(mut self, tag: impl Into<String>, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_shutdown
            .push((tag.into(), Box::new(move |token| Box::pin(task(token)))));
        self
    }

    /// Serve until a termination signal arrives, then drain gracefully.
    pub async fn serve(self) -> Result<(), BoxError> {
        self.serve_with_token(CancellationToken::new()).await
    }

    /// Like [`RestApp::serve`], parented to an external cancellation token.
    pub async fn serve_with_token(self, parent: CancellationToken) -> Result<(), BoxError> {
        let Self {
            config,
            router,
            on_shutdown,
        } = self;

        let mut coordinator = Coordinator::with_token(parent);
        coordinator.set_max_shutdown_time(config.shutdown.max_shutdown_time());
        coordinator.set_max_concurrent_hooks(config.shutdown.max_concurrent_hooks);
        coordinator.set_cancel_on_error(config.shutdown.cancel_on_error);

        let listener = TcpListener::bind(&config.server.bind_address).await?;
        let local_addr = listener.local_addr()?;
        info!(
            app = %config.server.app_name,
            address = %local_addr,
            "listening for connections"
        );

        let app = router.layer(middleware::from_fn(request_id));

        // The stop token pairs the serve worker with its shutdown hook, the
        // same way a listen/stop call pair would be wired by hand.
        let stop = CancellationToken::new();
        let drain = stop.clone();
        coordinator.register_worker(move |_run| async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(drain.cancelled_owned())
                .await
                .map_err(Into::into)
        });
        coordinator.register_shutdown_hook("http server", move |_shutdown| async move {
            stop.cancel();
            Ok(())
        });

        for (tag, task) in on_shutdown {
            coordinator.register_shutdown_hook(tag, move |token| task(token));
        }

        let result = coordinator.run().await;
        if let Err(ref err) = result {
            error!(error = %err, "lifecycle run finished with error");
        }
        result
    }
}

/// Attach a fresh request ID, echoed on the response, so log lines across
/// subsystems correlate.
async fn request_id(mut request: Request, next: Next) -> Response {
    let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok();
    if let Some(value) = &id {
        request.headers_mut().insert(X_REQUEST_ID.clone(), value.clone());
    }
    let mut response = next.run(request).await;
    if let Some(value) = id {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}
