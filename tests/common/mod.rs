//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use kfrs::config::ServerConfig;
use tempfile::TempDir;
use tower::ServiceExt;

pub const INDEX_BODY: &str = "<html>KF redirect</html>";
pub const MAP_BODY: &[u8] = b"\x01\x02uz2 map payload";

/// A served root inside a scratch directory, so files can also be placed
/// next to (outside) the root.
pub struct Fixture {
    pub base: TempDir,
    pub root: PathBuf,
}

impl Fixture {
    /// Root with an index, a map, a plain text file and a `.uz2` directory.
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.write("index.html", INDEX_BODY.as_bytes());
        fixture.write("KF-Farm.rom.uz2", MAP_BODY);
        fixture.write("notes.txt", b"not a redirect file");
        fixture.write("maps/KF-Manor.rom.uz2", b"manor");
        fs::create_dir_all(fixture.root.join("folder.uz2")).unwrap();
        fs::write(fixture.base.path().join("secret.uz2"), b"outside root").unwrap();
        fixture
    }

    /// Root with no files at all.
    pub fn empty() -> Self {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("redirect");
        fs::create_dir_all(&root).unwrap();
        Self { base, root }
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn config(&self, max_requests: u32) -> ServerConfig {
        server_config(&self.root, max_requests)
    }
}

pub fn server_config(root: &Path, max_requests: u32) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        serve_dir: root.to_path_buf(),
        max_requests,
        ban_time: 1,
        ..ServerConfig::default()
    }
}

pub fn client(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, last_octet], 40000))
}

/// Drive one request through the router as if it came from `peer`.
pub async fn send(router: &Router, peer: SocketAddr, method: &str, uri: &str) -> Response<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, peer: SocketAddr, uri: &str) -> Response<Body> {
    send(router, peer, "GET", uri).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn assert_rejected(response: Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status);
    let reason = status.canonical_reason().unwrap();
    assert_eq!(body_bytes(response).await, reason.as_bytes());
}
