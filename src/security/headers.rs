//! Defensive response headers.
//!
//! # Responsibilities
//! - Stamp the fixed hardening header set on every response, including guard
//!   rejections produced further down the chain
//! - Carry the optional Content-Security-Policy from configuration
//! - Tag responses with a production timestamp
//!
//! # Design Decisions
//! - Headers are computed per response, never cached
//! - CSP is off unless a policy string is configured

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Fixed informational header value, verbatim.
pub const WORDS_OF_WISDOM: &str =
    "\"You come at the king, you best not miss.\" - Omar Little";

pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains; preload";

/// Per-process header policy, built once from configuration.
#[derive(Clone)]
pub struct HeaderPolicy {
    csp: Option<HeaderValue>,
}

impl HeaderPolicy {
    pub fn new(csp: Option<&str>) -> Self {
        let csp = csp.and_then(|raw| match HeaderValue::from_str(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(error = %e, "Configured CSP is not header-safe; disabling");
                None
            }
        });
        Self { csp }
    }
}

/// Middleware stamping the defensive header set on every outgoing response.
pub async fn headers_middleware(
    State(policy): State<HeaderPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(HSTS_VALUE),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("same-origin"));
    if let Some(csp) = &policy.csp {
        headers.insert(header::CONTENT_SECURITY_POLICY, csp.clone());
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    if let Ok(ts) = HeaderValue::from_str(&now_ms.to_string()) {
        headers.insert("x-timestamp", ts);
    }
    headers.insert("x-words-of-wisdom", HeaderValue::from_static(WORDS_OF_WISDOM));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    async fn respond(router: Router) -> Response {
        router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn harness(policy: HeaderPolicy) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(policy, headers_middleware))
    }

    #[tokio::test]
    async fn fixed_set_is_stamped() {
        let response = respond(harness(HeaderPolicy::new(None))).await;
        let headers = response.headers();

        assert_eq!(headers[header::X_FRAME_OPTIONS.as_str()], "SAMEORIGIN");
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY.as_str()], HSTS_VALUE);
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS.as_str()], "nosniff");
        assert_eq!(headers[header::X_XSS_PROTECTION.as_str()], "1; mode=block");
        assert_eq!(headers[header::REFERRER_POLICY.as_str()], "same-origin");
        assert_eq!(headers["x-words-of-wisdom"], WORDS_OF_WISDOM);
        assert!(headers.get(header::CONTENT_SECURITY_POLICY.as_str()).is_none());

        let ts: u128 = headers["x-timestamp"].to_str().unwrap().parse().unwrap();
        assert!(ts > 0);
    }

    #[tokio::test]
    async fn csp_appears_when_configured() {
        let policy = HeaderPolicy::new(Some("default-src 'self'"));
        let response = respond(harness(policy)).await;
        assert_eq!(
            response.headers()[header::CONTENT_SECURITY_POLICY.as_str()],
            "default-src 'self'"
        );
    }
}
