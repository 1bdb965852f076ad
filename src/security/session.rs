//! Session guard: signed session cookies.
//!
//! Cookie value format is `"<uuid>.<hex hmac-sha256>"`. New cookies are
//! signed with the first configured secret; verification accepts any
//! configured secret so keys can rotate without logging everyone out. The
//! guard never rejects a request: a missing or invalid cookie just gets a
//! fresh session issued on the way out.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use crate::observability::metrics;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// A live session entry.
#[derive(Debug, Clone)]
pub struct Session {
    /// Token a mutating request must echo back.
    pub csrf_token: String,
    pub created_at: SystemTime,
    /// Set once the session has survived its first full request.
    pub initialized: bool,
}

impl Session {
    fn fresh() -> Self {
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        Self {
            csrf_token: hex::encode(raw),
            created_at: SystemTime::now(),
            initialized: false,
        }
    }
}

/// Identity attached to every request after the session guard has run.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub id: String,
    pub csrf_token: String,
    /// True when this request caused the session to be issued.
    pub fresh: bool,
}

/// Shared state for the session guard: signing secrets plus the in-process
/// session table.
pub struct SessionStore {
    secrets: Vec<String>,
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Create a store. `secrets` must contain at least one entry; the env
    /// loader guarantees this by substituting the fallback secret.
    pub fn new(secrets: Vec<String>) -> Self {
        debug_assert!(!secrets.is_empty(), "session store needs at least one secret");
        Self {
            secrets,
            sessions: DashMap::new(),
        }
    }

    /// Sign `id` with the primary secret, returning the hex signature.
    pub fn sign(&self, id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secrets[0].as_bytes())
            .expect("hmac accepts any key length");
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify `sig_hex` over `id` against every configured secret.
    pub fn verify(&self, id: &str, sig_hex: &str) -> bool {
        let Ok(sig) = hex::decode(sig_hex) else {
            return false;
        };
        self.secrets.iter().any(|secret| {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("hmac accepts any key length");
            mac.update(id.as_bytes());
            mac.verify_slice(&sig).is_ok()
        })
    }

    /// Validate a raw cookie value and return the session id it names.
    ///
    /// A signature-valid id whose entry is gone (restart, eviction) gets a
    /// fresh entry under the same id; the client keeps its cookie.
    pub fn authenticate(&self, cookie_value: &str) -> Option<String> {
        let (id, sig) = cookie_value.split_once('.')?;
        if id.is_empty() || !self.verify(id, sig) {
            return None;
        }
        self.sessions
            .entry(id.to_string())
            .or_insert_with(Session::fresh);
        Some(id.to_string())
    }

    /// Mint a new session. Returns the id and the signed cookie value.
    pub fn create(&self) -> (String, String) {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), Session::fresh());
        let value = format!("{id}.{}", self.sign(&id));
        (id, value)
    }

    pub fn csrf_token(&self, id: &str) -> Option<String> {
        self.sessions.get(id).map(|s| s.csrf_token.clone())
    }

    pub fn mark_initialized(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.initialized = true;
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Middleware binding a signed session to the request/response pair.
pub async fn session_middleware(
    State(store): State<Arc<SessionStore>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string());

    let (id, set_cookie) = match presented.as_deref().and_then(|v| store.authenticate(v)) {
        Some(id) => (id, None),
        None => {
            let (id, value) = store.create();
            metrics::record_session_created();
            let cookie = Cookie::build((SESSION_COOKIE, value))
                .path("/")
                .secure(true)
                .http_only(true)
                .build();
            (id, Some(cookie.to_string()))
        }
    };

    let csrf_token = store.csrf_token(&id).unwrap_or_default();
    request.extensions_mut().insert(SessionContext {
        id: id.clone(),
        csrf_token,
        fresh: set_cookie.is_some(),
    });

    let mut response = next.run(request).await;

    if let Some(value) = set_cookie {
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                response.headers_mut().append(header::SET_COOKIE, v);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie not header-safe"),
        }
    }
    store.mark_initialized(&id);

    response
}
