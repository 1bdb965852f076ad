//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so the same structs can be deserialized from
//! a file later without touching the env loader.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Secret used to sign session cookies when `SESSION_SECRET` is not set.
/// The env loader warns once when this fallback is in effect.
pub const DEFAULT_SESSION_SECRET: &str = "MySessionSecret";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static content delivery settings.
    pub content: ContentConfig,

    /// Session cookie signing settings.
    pub session: SessionConfig,

    /// Response hardening settings.
    pub security: SecurityConfig,

    /// Access-log audit settings.
    pub audit: AuditConfig,

    /// Admission control (rate / DDoS) settings.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
        }
    }
}

/// Static content delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Root directory served to clients.
    pub root: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
        }
    }
}

/// Session cookie signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ordered signing secrets. The first signs new cookies; every entry is
    /// accepted during verification, which allows key rotation without
    /// invalidating live sessions.
    pub secrets: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secrets: vec![DEFAULT_SESSION_SECRET.to_string()],
        }
    }
}

/// Response hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Content-Security-Policy value. Off unless a policy string is supplied.
    pub content_security_policy: Option<String>,

    /// Maximum form body size buffered while looking for a CSRF field.
    pub form_body_limit: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            content_security_policy: None,
            form_body_limit: 64 * 1024,
        }
    }
}

/// Access-log audit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable the audit sink.
    pub enabled: bool,

    /// Append target for access-log lines.
    pub log_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: PathBuf::from("access.log"),
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Requests admitted per burst interval before a client is throttled.
    pub burst_allowance: u32,

    /// Saturation cap on the burst counter.
    pub burst_limit: u32,

    /// Burst interval in milliseconds.
    pub burst_interval_ms: u64,

    /// Requests admitted per quota window before a client is blocked.
    pub quota_max: u32,

    /// Quota window in seconds.
    pub quota_window_secs: u64,

    /// Idle period after which a client's counters are evicted.
    pub idle_eviction_secs: u64,

    /// Interval between eviction sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            burst_allowance: 10,
            burst_limit: 15,
            burst_interval_ms: 1_000,
            quota_max: 100,
            quota_window_secs: 15 * 60,
            idle_eviction_secs: 5 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }

    /// Saturation cap for the burst counter. Never below the allowance, so a
    /// throttled client's counter cannot drop back under the allowance before
    /// the interval rolls over.
    pub fn burst_cap(&self) -> u32 {
        self.burst_limit.max(self.burst_allowance)
    }

    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.quota_window_secs)
    }

    pub fn idle_eviction(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
