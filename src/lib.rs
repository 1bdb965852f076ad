//! Hardened static content gateway.
//!
//! Every request passes through a fixed guard chain before any file byte is
//! served:
//!
//! ```text
//! request ──▶ session ──▶ headers ──▶ csrf ──▶ audit ──▶ admission ──▶ static files
//!             (cookie)    (stamp)    (403)    (log)     (429)          (ServeDir)
//! ```
//!
//! Guards disabled by configuration are removed from the chain at assembly
//! time rather than short-circuited per request.

pub mod config;
pub mod http;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
