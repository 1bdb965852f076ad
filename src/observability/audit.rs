//! Request audit sink.
//!
//! One structured line per completed request, appended to the access log.
//! Lines are funneled through a single writer task so concurrent requests
//! never interleave mid-line. A failed append is logged operationally and
//! never affects the client-facing response.

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::observability::metrics;

/// One access-log line.
#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    ts: u64,
    addr: String,
    method: &'a str,
    path: &'a str,
    status: u16,
    elapsed_ms: u64,
}

/// Handle for submitting audit lines to the writer task.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::UnboundedSender<String>,
}

impl AuditSink {
    /// Open `path` for append and spawn the writer task.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let mut file = tokio::fs::File::from_std(file);

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::warn!(error = %e, "Audit log write failed");
                    continue;
                }
                if let Err(e) = file.flush().await {
                    tracing::warn!(error = %e, "Audit log flush failed");
                }
            }
        });

        Ok(Self { tx })
    }

    fn submit(&self, mut line: String) {
        line.push('\n');
        if self.tx.send(line).is_err() {
            tracing::warn!("Audit writer task gone; dropping access-log line");
        }
    }
}

/// Middleware recording method, path, status and timing for every request
/// that reaches this stage.
pub async fn audit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(sink): State<AuditSink>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);

    let record = AuditRecord {
        ts: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
        addr: addr.ip().to_string(),
        method: &method,
        path: &path,
        status,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    match serde_json::to_string(&record) {
        Ok(line) => sink.submit(line),
        Err(e) => tracing::warn!(error = %e, "Failed to encode audit record"),
    }

    response
}
