//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → env.rs (read & parse recognized variables)
//!     → GatewayConfig (typed, immutable)
//!     → shared by value/Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no ambient lookups inside guard logic
//! - All fields have defaults so an empty environment still boots
//! - Stage flags decide pipeline membership at assembly time

pub mod env;
pub mod schema;

pub use schema::GatewayConfig;
pub use schema::AuditConfig;
pub use schema::RateLimitConfig;
pub use schema::SessionConfig;
