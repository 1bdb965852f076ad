//! HTTP server setup and guard-chain assembly.
//!
//! # Responsibilities
//! - Build the Axum router with the static file service at its core
//! - Wire the guard chain in its fixed order:
//!   session → headers → csrf → audit → admission → delivery
//! - Leave disabled stages out of the chain entirely
//! - Serve with graceful shutdown
//!
//! Layer ordering note: axum applies the last-added layer first on the
//! request path, so guards are added innermost-first below.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::observability::audit::{self, AuditSink};
use crate::security::csrf::{self, CsrfPolicy};
use crate::security::headers::{self, HeaderPolicy};
use crate::security::rate_limit::{self, AdmissionState};
use crate::security::session::{self, SessionStore};

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Assemble the guard pipeline from configuration.
    ///
    /// Stages disabled by configuration are never constructed: no admission
    /// state, no open log file.
    pub fn new(config: GatewayConfig) -> std::io::Result<Self> {
        let sessions = Arc::new(SessionStore::new(config.session.secrets.clone()));
        let header_policy = HeaderPolicy::new(config.security.content_security_policy.as_deref());
        let csrf_policy = CsrfPolicy {
            form_body_limit: config.security.form_body_limit,
        };

        let mut router = Router::new().fallback_service(ServeDir::new(&config.content.root));

        if config.rate_limit.enabled {
            let admission = Arc::new(AdmissionState::new(config.rate_limit.clone()));
            rate_limit::spawn_sweeper(admission.clone());
            router = router.layer(middleware::from_fn_with_state(
                admission,
                rate_limit::admission_middleware,
            ));
        }

        if config.audit.enabled {
            let sink = AuditSink::open(&config.audit.log_path)?;
            router = router.layer(middleware::from_fn_with_state(sink, audit::audit_middleware));
        }

        let router = router
            .layer(middleware::from_fn_with_state(csrf_policy, csrf::csrf_middleware))
            .layer(middleware::from_fn_with_state(
                header_policy,
                headers::headers_middleware,
            ))
            .layer(middleware::from_fn_with_state(sessions, session::session_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http());

        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.content.root.display(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
