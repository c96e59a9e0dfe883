//! Router assembly and the serving loop

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use stackd_exec::Executor;
use stackd_foundation::{Config, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{log_requests, require_bearer};
use crate::routes;

/// Fixed request-body ceiling; larger payloads get a 413 before decoding
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared handler state: the process config and the one executor instance
/// reused across all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub executor: Arc<dyn Executor>,
}

/// Build the full middleware/route stack.
///
/// `/healthz` sits outside the auth layer so it stays servable without
/// credentials and without touching the executor gate.
pub fn build_router(state: AppState) -> Router {
    let projects = Router::new()
        .route("/v1/projects/provision", post(routes::provision))
        .route("/v1/projects/stop", post(routes::stop))
        .route("/v1/projects/destroy", post(routes::destroy))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/healthz", get(routes::healthz))
        .merge(projects)
        .layer(axum_middleware::from_fn(log_requests))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// The stackd HTTP server
pub struct Server {
    config: Arc<Config>,
    executor: Arc<dyn Executor>,
}

impl Server {
    pub fn new(config: Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            config: Arc::new(config),
            executor,
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            config: Arc::clone(&self.config),
            executor: Arc::clone(&self.executor),
        })
    }

    /// Bind and serve until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = bind_addr(&self.config.listen_addr);
        let listener = TcpListener::bind(&addr).await?;
        info!(
            %addr,
            read_timeout = ?self.config.read_timeout,
            read_header_timeout = ?self.config.read_header_timeout,
            write_timeout = ?self.config.write_timeout,
            idle_timeout = ?self.config.idle_timeout,
            command_timeout = ?self.config.command_timeout,
            "stackd listening"
        );

        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// `:8085` style addresses bind every interface
fn bind_addr(listen_addr: &str) -> String {
    if let Some(port) = listen_addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        listen_addr.to_string()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_expands_bare_port() {
        assert_eq!(bind_addr(":8085"), "0.0.0.0:8085");
        assert_eq!(bind_addr("127.0.0.1:9000"), "127.0.0.1:9000");
    }
}
