//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured operational log events)
//!     → metrics.rs (counters, histograms)
//!
//! Per completed request:
//!     → audit.rs (one JSON line appended to the access log)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → access.log (durable append stream)
//! ```
//!
//! # Design Decisions
//! - Operational log and audit sink are separate streams
//! - Audit write failures never surface in client responses
//! - Metrics are cheap (atomic increments)

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::AuditSink;
