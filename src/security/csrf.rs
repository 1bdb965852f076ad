//! CSRF protection for state-changing requests.
//!
//! Mutating methods must echo the session's token via the `x-csrf-token`
//! request header or a `_csrf` field in an urlencoded form body. Safe
//! methods (GET/HEAD/OPTIONS) pass through and get the token surfaced in an
//! `x-csrf-token` response header so same-origin page script can pick it up;
//! there is no template layer to embed it in.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use subtle::ConstantTimeEq;

use crate::observability::metrics;
use crate::security::session::SessionContext;

/// Header carrying the CSRF token, both directions.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Form field carrying the CSRF token.
pub const CSRF_FIELD: &str = "_csrf";

/// Guard policy, built once from configuration.
#[derive(Clone)]
pub struct CsrfPolicy {
    /// Cap on how much of a form body is buffered while looking for the
    /// token field.
    pub form_body_limit: usize,
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn reject() -> Response {
    (StatusCode::FORBIDDEN, "CSRF token missing or invalid").into_response()
}

/// Constant-time token comparison; the token is a secret, so the check must
/// not leak how much of a guess was right.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Middleware enforcing the session-bound token on mutating requests.
pub async fn csrf_middleware(
    State(policy): State<CsrfPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // The session guard runs first and always attaches a context; a missing
    // one means the chain is miswired, so fail closed.
    let Some(ctx) = request.extensions().get::<SessionContext>().cloned() else {
        tracing::error!("CSRF guard ran without a session context");
        return reject();
    };

    if is_safe(request.method()) {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&ctx.csrf_token) {
            response.headers_mut().insert(CSRF_HEADER, value);
        }
        return response;
    }

    let (request, presented) = extract_token(request, policy.form_body_limit).await;
    match presented {
        Some(token) if token_matches(&token, &ctx.csrf_token) => next.run(request).await,
        presented => {
            tracing::warn!(
                session = %ctx.id,
                method = %request.method(),
                path = %request.uri().path(),
                token_present = presented.is_some(),
                "CSRF token mismatch"
            );
            metrics::record_csrf_rejected();
            reject()
        }
    }
}

/// Pull the presented token from the header or, failing that, from an
/// urlencoded form body. The body is buffered under `limit` bytes and
/// replayed verbatim so later stages see the request unchanged.
async fn extract_token(request: Request<Body>, limit: usize) -> (Request<Body>, Option<String>) {
    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if header_token.is_some() {
        return (request, header_token);
    }

    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return (request, None);
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer form body for CSRF check");
            return (Request::from_parts(parts, Body::empty()), None);
        }
    };

    let token = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned());

    (Request::from_parts(parts, Body::from(bytes)), token)
}
