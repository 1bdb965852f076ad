//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use bastion::{GatewayConfig, HttpServer};
use tempfile::TempDir;

/// Create a scratch site root with a couple of files.
pub fn scratch_site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
    std::fs::write(dir.path().join("page.html"), "<p>page</p>").unwrap();
    dir
}

/// Start the gateway on an ephemeral loopback port, serving `site`.
pub async fn start_gateway(mut config: GatewayConfig, site: &TempDir) -> SocketAddr {
    config.content.root = site.path().to_path_buf();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).expect("gateway should assemble");

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    addr
}

/// A non-pooling client that ignores any ambient proxy settings.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Pull the `sid=<value>` pair out of a Set-Cookie header, if any.
#[allow(dead_code)]
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    let raw = response
        .headers()
        .get(reqwest::header::SET_COOKIE)?
        .to_str()
        .ok()?;
    raw.split(';').next().map(str::to_owned)
}

/// The raw cookie value (after `sid=`).
#[allow(dead_code)]
pub fn cookie_value(pair: &str) -> &str {
    pair.strip_prefix("sid=").expect("session cookie pair")
}
