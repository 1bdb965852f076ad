//! Configuration loading from the process environment.
//!
//! Recognized variables:
//! - `SESSION_SECRET` — string or comma-separated ordered list; the first
//!   entry signs new session cookies, every entry verifies.
//! - `LOGGING` — enables the audit sink.
//! - `RATE_LIMIT` — enables admission control.
//! - `SITE_ROOT` — content root directory (default `public`).
//! - `PORT` — listen port (default `8888`), `HOST` — listen address.
//! - `CONTENT_SECURITY_POLICY` — CSP value; header is omitted when unset.
//! - `RATE_LIMIT_BURST` / `RATE_LIMIT_QUOTA` — numeric admission overrides.
//! - `METRICS` / `METRICS_ADDRESS` — Prometheus exporter toggle and bind.
//!
//! Boolean flags are enabled iff the value is `"true"` (ASCII
//! case-insensitive) or `"1"`. Anything else, including unset, leaves the
//! stage off. The comparison is deliberately string-typed.

use thiserror::Error;

use crate::config::schema::{GatewayConfig, DEFAULT_SESSION_SECRET};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Build a [`GatewayConfig`] from the process environment.
pub fn from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();

    let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port: u16 = match var("PORT") {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: raw })?,
        None => 8888,
    };
    config.listener.bind_address = format!("{host}:{port}");

    if let Some(root) = var("SITE_ROOT") {
        config.content.root = root.into();
    }

    let secrets = var("SESSION_SECRET")
        .map(|raw| parse_secrets(&raw))
        .unwrap_or_default();
    if secrets.is_empty() {
        tracing::warn!("SESSION_SECRET not set. Using a built-in fallback secret.");
        config.session.secrets = vec![DEFAULT_SESSION_SECRET.to_string()];
    } else {
        config.session.secrets = secrets;
    }

    config.audit.enabled = var("LOGGING").is_some_and(|v| parse_flag(&v));
    config.rate_limit.enabled = var("RATE_LIMIT").is_some_and(|v| parse_flag(&v));

    if let Some(raw) = var("RATE_LIMIT_BURST") {
        config.rate_limit.burst_allowance = raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "RATE_LIMIT_BURST", value: raw })?;
    }
    if let Some(raw) = var("RATE_LIMIT_QUOTA") {
        config.rate_limit.quota_max = raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "RATE_LIMIT_QUOTA", value: raw })?;
    }

    config.security.content_security_policy = var("CONTENT_SECURITY_POLICY");

    config.observability.metrics_enabled = var("METRICS").is_some_and(|v| parse_flag(&v));
    if let Some(addr) = var("METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    Ok(config)
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `"true"` (any case) or `"1"` enable a stage; everything else leaves it off.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Split a comma-separated secret list, dropping empty entries.
pub fn parse_secrets(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
