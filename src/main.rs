//! Hardened static content gateway.
//!
//! Serves a directory of static files behind a fixed chain of guards:
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    GATEWAY                       │
//!                    │                                                  │
//!  Client Request    │  ┌─────────┐   ┌──────────┐   ┌──────────────┐  │
//!  ──────────────────┼─▶│ session │──▶│ csrf +   │──▶│ audit sink   │  │
//!                    │  │ guard   │   │ headers  │   │ (optional)   │  │
//!                    │  └─────────┘   └──────────┘   └──────┬───────┘  │
//!                    │                                      │          │
//!                    │                                      ▼          │
//!  Client Response   │  ┌─────────┐                 ┌──────────────┐   │
//!  ◀─────────────────┼──│ static  │◀────────────────│  admission   │   │
//!                    │  │ files   │                 │  (optional)  │   │
//!                    │  └─────────┘                 └──────────────┘   │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! Any guard may terminate the request with a complete error response; only
//! a request that survives every guard reaches content delivery.

use tokio::net::TcpListener;

use bastion::config;
use bastion::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    bastion::observability::logging::init("bastion=debug,tower_http=debug");

    tracing::info!("bastion v0.1.0 starting");

    let config = config::env::from_env()?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        site_root = %config.content.root.display(),
        audit = config.audit.enabled,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => bastion::observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(
                bind_address = %config.listener.bind_address,
                error = %e,
                "Failed to bind listener"
            );
            return Err(e.into());
        }
    };

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
