//! Admission control: burst suppression plus quota enforcement.
//!
//! Each client address carries two counters. The burst counter catches
//! rapid-fire abuse inside a short interval; the quota counter caps sustained
//! volume across a rolling window. A client sits in one of three standings:
//! `Normal`, `Throttled` (burst exceeded, ends when the burst interval rolls
//! over) or `Blocked` (quota exceeded, ends when the quota window rolls
//! over). Rejections are complete 429 responses, never dropped connections,
//! and no delay tier exists: a request is admitted immediately or rejected.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Burst allowance exceeded inside the burst interval.
    Burst,
    /// Quota exceeded inside the rolling window.
    Quota,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Burst => "burst",
            Rejection::Quota => "quota",
        }
    }
}

/// Client standing as of the last observed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Normal,
    Throttled,
    Blocked,
}

/// Per-identity counters.
#[derive(Debug)]
struct RateWindow {
    burst_count: u32,
    burst_started: Instant,
    quota_count: u32,
    window_started: Instant,
    last_seen: Instant,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            burst_count: 0,
            burst_started: now,
            quota_count: 0,
            window_started: now,
            last_seen: now,
        }
    }

    fn roll_over(&mut self, config: &RateLimitConfig, now: Instant) {
        if now.duration_since(self.burst_started) >= config.burst_interval() {
            self.burst_count = 0;
            self.burst_started = now;
        }
        if now.duration_since(self.window_started) >= config.quota_window() {
            self.quota_count = 0;
            self.window_started = now;
        }
    }
}

/// Shared admission-control state: one counter pair per client address.
pub struct AdmissionState {
    windows: Mutex<HashMap<IpAddr, RateWindow>>,
    config: RateLimitConfig,
}

impl AdmissionState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Decide admission for one request from `ip` observed at `now`.
    ///
    /// Both checks must pass. Only admitted requests consume burst and quota;
    /// a rejected request never pushes a client further into its quota.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), Rejection> {
        let mut windows = self.windows.lock().expect("admission mutex poisoned");
        let window = windows.entry(ip).or_insert_with(|| RateWindow::new(now));
        window.last_seen = now;
        window.roll_over(&self.config, now);

        if window.quota_count + 1 > self.config.quota_max {
            return Err(Rejection::Quota);
        }
        if window.burst_count + 1 > self.config.burst_allowance {
            // Track the rejection up to the saturation cap so standing
            // reflects the abuse without growing unbounded. The cap never
            // sits below the allowance, so this write cannot shrink the
            // counter back under it mid-interval.
            window.burst_count = (window.burst_count + 1).min(self.config.burst_cap());
            return Err(Rejection::Burst);
        }

        window.burst_count += 1;
        window.quota_count += 1;
        Ok(())
    }

    /// Current standing of `ip`, without consuming anything.
    pub fn standing_at(&self, ip: IpAddr, now: Instant) -> Standing {
        let mut windows = self.windows.lock().expect("admission mutex poisoned");
        let Some(window) = windows.get_mut(&ip) else {
            return Standing::Normal;
        };
        window.roll_over(&self.config, now);
        if window.quota_count >= self.config.quota_max {
            Standing::Blocked
        } else if window.burst_count >= self.config.burst_allowance {
            Standing::Throttled
        } else {
            Standing::Normal
        }
    }

    /// Drop identities idle past the configured bound. Returns the number
    /// evicted.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("admission mutex poisoned");
        let before = windows.len();
        let idle = self.config.idle_eviction();
        windows.retain(|_, w| now.duration_since(w.last_seen) < idle);
        before - windows.len()
    }

    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().expect("admission mutex poisoned").len()
    }
}

/// Spawn the periodic sweep that bounds memory held by idle identities.
pub fn spawn_sweeper(state: Arc<AdmissionState>) {
    let interval = state.config.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            let evicted = state.evict_idle(Instant::now());
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    remaining = state.tracked_identities(),
                    "Evicted idle rate windows"
                );
            }
        }
    });
}

/// Middleware gating requests through admission control.
pub async fn admission_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AdmissionState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.check_at(addr.ip(), Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            tracing::warn!(
                client = %addr.ip(),
                reason = reason.as_str(),
                "Request rejected by admission control"
            );
            metrics::record_rate_limited(reason.as_str());
            (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response()
        }
    }
}
