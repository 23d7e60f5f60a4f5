//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Own the access guard for the lifetime of the server
//! - Build the Axum router with middleware (tracing, timeout, request ID)
//! - Bind the listener and serve on a background task
//! - Evict idle guard records periodically
//! - Bounded graceful shutdown

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::handler::{redirect_handler, AppState};
use crate::lifecycle::{Shutdown, ShutdownListener};
use crate::observability::metrics;
use crate::security::rate_limit::AccessGuard;

/// How long `start` waits for an early serve failure.
pub const STARTUP_GRACE: Duration = Duration::from_secs(1);

/// How long `stop` waits for in-flight requests.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] io::Error),
    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("server is already running")]
    AlreadyRunning,
    #[error("server is not running")]
    NotRunning,
    #[error("server has been stopped")]
    Stopped,
}

/// The redirect file server.
pub struct RedirectServer {
    config: ServerConfig,
    state: AppState,
    shutdown: Shutdown,
    local_addr: Option<SocketAddr>,
    server_task: Option<JoinHandle<io::Result<()>>>,
    sweeper_task: Option<JoinHandle<()>>,
}

impl RedirectServer {
    /// Create a server; nothing is bound until [`RedirectServer::start`].
    pub fn new(config: ServerConfig) -> Self {
        let guard = Arc::new(AccessGuard::from_config(&config));
        let state = AppState::new(guard, config.serve_dir.clone());
        Self {
            config,
            state,
            shutdown: Shutdown::new(),
            local_addr: None,
            server_task: None,
            sweeper_task: None,
        }
    }

    /// Configured `host:port`.
    pub fn address(&self) -> String {
        format_address(&self.config.host, self.config.port)
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn root_directory(&self) -> &Path {
        &self.config.serve_dir
    }

    pub fn guard(&self) -> &Arc<AccessGuard> {
        &self.state.guard
    }

    pub fn is_running(&self) -> bool {
        self.server_task.is_some()
    }

    /// The Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(redirect_handler)
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Bind and start serving in the background.
    ///
    /// Returns once the listener has survived [`STARTUP_GRACE`], or with the
    /// bind/serve error that happened first.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        if self.server_task.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        if self.shutdown.is_triggered() {
            return Err(ServerError::Stopped);
        }

        let address = self.address();
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        tracing::debug!(address = %local_addr, "Server starting to listen");

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let mut cancelled = self.shutdown.subscribe();
        let mut server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancelled.cancelled().await })
                .await
        });

        match tokio::time::timeout(STARTUP_GRACE, &mut server_task).await {
            Err(_) => {}
            Ok(Ok(Ok(()))) => {
                return Err(ServerError::Serve(io::Error::other("server exited during startup")))
            }
            Ok(Ok(Err(err))) => return Err(ServerError::Serve(err)),
            Ok(Err(err)) => return Err(ServerError::Join(err)),
        }

        if self.config.sweep_interval_secs > 0 {
            self.sweeper_task = Some(spawn_sweeper(
                self.state.guard.clone(),
                Duration::from_secs(self.config.sweep_interval_secs),
                self.shutdown.subscribe(),
            ));
        }

        self.local_addr = Some(local_addr);
        self.server_task = Some(server_task);
        tracing::info!(
            address = %local_addr,
            root = %self.config.serve_dir.display(),
            "Redirect server listening"
        );
        Ok(())
    }

    /// Cancel background work and drain in-flight requests, waiting at most
    /// [`SHUTDOWN_TIMEOUT`].
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let Some(mut server_task) = self.server_task.take() else {
            return Err(ServerError::NotRunning);
        };

        tracing::debug!("Cancelling server context");
        self.shutdown.trigger();

        tracing::debug!(timeout = ?SHUTDOWN_TIMEOUT, "Shutting down the server");
        let result = match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server_task).await {
            Ok(Ok(served)) => served.map_err(ServerError::Serve),
            Ok(Err(err)) => Err(ServerError::Join(err)),
            Err(_) => {
                server_task.abort();
                Err(ServerError::ShutdownTimeout(SHUTDOWN_TIMEOUT))
            }
        };

        if let Some(sweeper) = self.sweeper_task.take() {
            sweeper.abort();
        }

        if result.is_ok() {
            tracing::debug!("Server shutdown complete");
        }
        result
    }
}

impl Drop for RedirectServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// `host:port`, bracketing IPv6 literals.
fn format_address(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Periodically drops guard records that no longer affect admission.
fn spawn_sweeper(
    guard: Arc<AccessGuard>,
    interval: Duration,
    mut cancelled: ShutdownListener,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = guard.sweep_idle(Instant::now());
                    let tracked = guard.tracked_clients();
                    metrics::set_tracked_clients(tracked);
                    if removed > 0 {
                        tracing::debug!(removed, tracked, "Evicted idle clients");
                    }
                }
                _ = cancelled.cancelled() => {
                    tracing::debug!("Idle sweeper stopping");
                    break;
                }
            }
        }
    })
}
