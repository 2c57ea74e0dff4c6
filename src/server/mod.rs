//! HTTP API server
//!
//! Exposes task submission and status polling plus the informational
//! endpoints. Shuts down gracefully when the given signal future resolves;
//! tasks still running at that point are abandoned.

pub mod handlers;
pub mod rejection;
pub mod routes;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::tasks::TaskService;
use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tracing::info;

pub use rejection::{handle_rejection, ApiRejection};
pub use routes::routes;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(service: Arc<TaskService>, config: Arc<AppConfig>) -> Self {
        Self { service, config }
    }
}

pub struct ApiServer {
    state: AppState,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(state: AppState) -> AppResult<Self> {
        let host = state.config.server.host.as_str();
        let port = state.config.server.port;
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| AppError::internal(format!("cannot resolve {host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| AppError::internal(format!("no address for {host}:{port}")))?;

        Ok(Self { state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (bound, server) = warp::serve(routes(self.state))
            .try_bind_with_graceful_shutdown(self.addr, shutdown)
            .map_err(|e| AppError::internal(format!("failed to bind {}: {e}", self.addr)))?;

        info!(addr = %bound, "API server listening");
        server.await;
        info!("API server stopped");
        Ok(())
    }
}
