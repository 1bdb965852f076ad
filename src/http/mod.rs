//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, guard chain assembly)
//!     → security layers (session, headers, csrf, admission)
//!     → observability layers (audit, trace)
//!     → ServeDir (static content delivery)
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
