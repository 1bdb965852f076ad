//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → session.rs (bind a signed session identity)
//!     → headers.rs (stamp defensive response headers)
//!     → csrf.rs (verify token on mutating methods)
//!     → rate_limit.rs (admission control per client address)
//!     → Pass to content delivery
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any guard failure
//! - Rejections are complete HTTP responses, never connection drops
//! - Disabled guards are absent from the chain, not no-ops

pub mod csrf;
pub mod headers;
pub mod rate_limit;
pub mod session;
