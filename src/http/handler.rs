//! The redirect request handler.
//!
//! Every request runs the same ordered chain of checks; the first one that
//! fails decides the response:
//!
//! ```text
//! ban check → accounting → method → path containment
//!     → "/" serves index.html
//!     → .uz2 extension → stat (missing / error / directory)
//!     → ServeFile
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::Method,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::response::RedirectError;
use crate::observability::metrics;
use crate::security::path::{self, PathError};
use crate::security::rate_limit::{AccessGuard, Admission};

/// File served for `/`.
pub const INDEX_FILE: &str = "index.html";

/// The only suffix served besides the index.
pub const REDIRECT_SUFFIX: &str = ".uz2";

/// State injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AccessGuard>,
    pub root: Arc<PathBuf>,
}

impl AppState {
    pub fn new(guard: Arc<AccessGuard>, root: impl Into<PathBuf>) -> Self {
        Self {
            guard,
            root: Arc::new(root.into()),
        }
    }
}

/// Entry point for every request, whatever its path.
pub async fn redirect_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let start = Instant::now();
    let response = match handle(&state, peer, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn handle(state: &AppState, peer: SocketAddr, request: Request) -> Result<Response, RedirectError> {
    let client = peer.ip().to_string();
    let method = request.method().clone();
    let req_path = request.uri().path().to_string();

    tracing::debug!(client = %client, method = %method, path = %req_path, "Request received");

    match state.guard.admit(&client) {
        Admission::Blocked { remaining } => {
            tracing::warn!(client = %client, until_secs = remaining.as_secs(), "Client blocked");
            metrics::record_blocked();
            return Err(RedirectError::Forbidden);
        }
        Admission::Admitted { banned: true } => {
            tracing::warn!(
                client = %client,
                max_requests = state.guard.max_requests(),
                ban_secs = state.guard.ban_duration().as_secs(),
                "Client exceeded request threshold, banning"
            );
            metrics::record_ban();
        }
        Admission::Admitted { banned: false } => {}
    }

    if method != Method::GET {
        tracing::warn!(client = %client, method = %method, path = %req_path, "Method not allowed");
        return Err(RedirectError::MethodNotAllowed);
    }

    let resolved = match path::resolve(&state.root, &req_path) {
        Ok(resolved) => resolved,
        Err(err @ PathError::Root(_)) => {
            tracing::error!(root = %state.root.display(), error = %err, "Failed to resolve root directory");
            return Err(RedirectError::Internal);
        }
        Err(err) => {
            tracing::warn!(client = %client, path = %req_path, error = %err, "File path outside root directory");
            return Err(RedirectError::Forbidden);
        }
    };
    tracing::debug!(path = %req_path, resolved = %resolved.absolute.display(), "Resolved file path");

    if req_path == "/" || req_path.is_empty() {
        let index = resolved.root.join(INDEX_FILE);
        return match tokio::fs::metadata(&index).await {
            Ok(meta) if meta.is_file() => {
                tracing::debug!(file = %index.display(), "Serving default index file");
                Ok(serve(&index, request).await)
            }
            _ => {
                tracing::error!(file = %index.display(), "Index file not found");
                Err(RedirectError::Internal)
            }
        };
    }

    if !has_redirect_suffix(&resolved.requested) {
        tracing::warn!(client = %client, path = %req_path, "Forbidden file extension");
        return Err(RedirectError::Forbidden);
    }

    match tokio::fs::metadata(&resolved.absolute).await {
        Ok(meta) if meta.is_dir() => {
            tracing::warn!(client = %client, path = %req_path, "Requested path is a directory");
            Err(RedirectError::Forbidden)
        }
        Ok(_) => {
            tracing::debug!(file = %resolved.absolute.display(), "Serving file");
            Ok(serve(&resolved.absolute, request).await)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(client = %client, path = %req_path, "File not found");
            Err(RedirectError::NotFound)
        }
        Err(err) => {
            tracing::error!(file = %resolved.absolute.display(), error = %err, "Error checking file status");
            Err(RedirectError::Internal)
        }
    }
}

// Checked on the request path as sent: cleaning would drop a trailing `/`
// or `/.` and let a non-`.uz2` path reach the file.
fn has_redirect_suffix(request_path: &str) -> bool {
    request_path.ends_with(REDIRECT_SUFFIX)
}

/// Streams `file` with conditional and range support.
async fn serve(file: &Path, request: Request) -> Response {
    match ServeFile::new(file).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
