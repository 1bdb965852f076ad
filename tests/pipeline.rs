//! End-to-end tests for the guard pipeline.

use std::time::Duration;

use axum::http::StatusCode;
use bastion::config::GatewayConfig;
use bastion::security::headers::{HSTS_VALUE, WORDS_OF_WISDOM};
use bastion::security::session::SessionStore;

mod common;

fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.session.secrets = vec!["integration-secret".to_string()];
    config
}

#[tokio::test]
async fn fresh_request_gets_signed_session_cookie() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let response = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("gateway unreachable");
    assert_eq!(response.status(), StatusCode::OK);

    let raw = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("new session should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("Secure"));
    assert!(raw.contains("Path=/"));

    // The identifier inside the cookie verifies against the primary secret.
    let pair = raw.split(';').next().unwrap();
    let value = pair.strip_prefix("sid=").expect("cookie named sid");
    let verifier = SessionStore::new(vec!["integration-secret".to_string()]);
    assert!(verifier.authenticate(value).is_some());
}

#[tokio::test]
async fn valid_session_cookie_is_not_reissued() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let first = client.get(format!("http://{addr}/")).send().await.unwrap();
    let pair = common::session_cookie(&first).expect("first request sets a cookie");

    let second = client
        .get(format!("http://{addr}/"))
        .header(reqwest::header::COOKIE, &pair)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert!(
        second.headers().get(reqwest::header::SET_COOKIE).is_none(),
        "a valid session must not be reissued"
    );
}

#[tokio::test]
async fn cookie_signed_with_secondary_secret_still_verifies() {
    let site = common::scratch_site();
    let mut config = base_config();
    config.session.secrets = vec!["new-secret".to_string(), "old-secret".to_string()];
    let addr = common::start_gateway(config, &site).await;
    let client = common::client();

    // A cookie minted under the old key alone.
    let old_signer = SessionStore::new(vec!["old-secret".to_string()]);
    let (_, value) = old_signer.create();

    let response = client
        .get(format!("http://{addr}/"))
        .header(reqwest::header::COOKIE, format!("sid={value}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().get(reqwest::header::SET_COOKIE).is_none(),
        "rotation: old-key cookies stay valid"
    );

    // A cookie under a key that was never configured gets replaced.
    let stranger = SessionStore::new(vec!["unrelated".to_string()]);
    let (_, bogus) = stranger.create();
    let response = client
        .get(format!("http://{addr}/"))
        .header(reqwest::header::COOKIE, format!("sid={bogus}"))
        .send()
        .await
        .unwrap();
    assert!(response.headers().get(reqwest::header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn mutating_request_without_token_is_forbidden() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    for method in [
        reqwest::Method::POST,
        reqwest::Method::PUT,
        reqwest::Method::DELETE,
        reqwest::Method::PATCH,
    ] {
        let response = client
            .request(method.clone(), format!("http://{addr}/index.html"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "method {method}");
    }
}

#[tokio::test]
async fn mutating_request_with_header_token_passes_the_guard() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let probe = client.get(format!("http://{addr}/")).send().await.unwrap();
    let pair = common::session_cookie(&probe).unwrap();
    let token = probe
        .headers()
        .get("x-csrf-token")
        .expect("safe responses surface the session token")
        .to_str()
        .unwrap()
        .to_string();

    // The static file service only answers GET/HEAD; 405 proves the request
    // cleared the CSRF guard and reached delivery.
    let response = client
        .post(format!("http://{addr}/index.html"))
        .header(reqwest::header::COOKIE, &pair)
        .header("x-csrf-token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn mutating_request_with_form_token_passes_the_guard() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let probe = client.get(format!("http://{addr}/")).send().await.unwrap();
    let pair = common::session_cookie(&probe).unwrap();
    let token = probe.headers()["x-csrf-token"].to_str().unwrap().to_string();

    let response = client
        .post(format!("http://{addr}/index.html"))
        .header(reqwest::header::COOKIE, &pair)
        .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("name=omar&_csrf={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    // A wrong field value still fails closed.
    let response = client
        .post(format!("http://{addr}/index.html"))
        .header(reqwest::header::COOKIE, &pair)
        .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("name=omar&_csrf=wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn defensive_headers_on_every_response() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let ok = client.get(format!("http://{addr}/")).send().await.unwrap();
    let missing = client
        .get(format!("http://{addr}/nope.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let forbidden = client
        .post(format!("http://{addr}/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    for response in [&ok, &missing, &forbidden] {
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["strict-transport-security"], HSTS_VALUE);
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["referrer-policy"], "same-origin");
        assert_eq!(headers["x-words-of-wisdom"], WORDS_OF_WISDOM);
        let ts: u128 = headers["x-timestamp"].to_str().unwrap().parse().unwrap();
        assert!(ts > 0);
        assert!(headers.get("content-security-policy").is_none());

        // Nothing may advertise the server implementation.
        assert!(headers.get("x-powered-by").is_none());
        assert!(headers.get("server").is_none());
    }
}

#[tokio::test]
async fn csp_header_enabled_by_configuration_alone() {
    let site = common::scratch_site();
    let mut config = base_config();
    config.security.content_security_policy = Some("default-src 'self'".to_string());
    let addr = common::start_gateway(config, &site).await;

    let response = common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["content-security-policy"], "default-src 'self'");
}

#[tokio::test]
async fn burst_suppression_throttles_then_recovers() {
    let site = common::scratch_site();
    let mut config = base_config();
    config.rate_limit.enabled = true; // defaults: allowance 10 per second
    let addr = common::start_gateway(config, &site).await;
    let client = common::client();

    let mut statuses = Vec::new();
    for _ in 0..16 {
        let response = client.get(format!("http://{addr}/")).send().await.unwrap();
        statuses.push(response.status());
    }
    assert!(
        statuses[..10].iter().all(|s| *s == StatusCode::OK),
        "requests within the allowance are admitted: {statuses:?}"
    );
    assert!(
        statuses[10..].iter().any(|s| *s == StatusCode::TOO_MANY_REQUESTS),
        "requests past the allowance are throttled: {statuses:?}"
    );

    // A throttled rejection is still a complete, hardened response.
    let throttled = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(throttled.headers()["x-frame-options"], "SAMEORIGIN");

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    let recovered = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(recovered.status(), StatusCode::OK);
}

#[tokio::test]
async fn quota_boundary_is_exact_and_window_resets() {
    let site = common::scratch_site();
    let mut config = base_config();
    config.rate_limit.enabled = true;
    config.rate_limit.burst_allowance = 1_000; // keep burst out of the way
    config.rate_limit.burst_limit = 1_000;
    config.rate_limit.quota_max = 5;
    config.rate_limit.quota_window_secs = 1;
    let addr = common::start_gateway(config, &site).await;
    let client = common::client();

    for i in 0..5 {
        let response = client.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i} within quota");
    }
    let over = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(over.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    let reset = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(reset.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_limiter_never_rejects() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    for _ in 0..40 {
        let response = client.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn audit_sink_writes_one_json_line_per_request() {
    let site = common::scratch_site();
    let log_dir = tempfile::tempdir().unwrap();
    let log_path = log_dir.path().join("access.log");

    let mut config = base_config();
    config.audit.enabled = true;
    config.audit.log_path = log_path.clone();
    let addr = common::start_gateway(config, &site).await;
    let client = common::client();

    client.get(format!("http://{addr}/")).send().await.unwrap();
    client
        .get(format!("http://{addr}/nope.html"))
        .send()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["method"], "GET");
    assert_eq!(first["path"], "/");
    assert_eq!(first["status"], 200);
    assert!(first["elapsed_ms"].is_u64());

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["path"], "/nope.html");
    assert_eq!(second["status"], 404);
}

#[tokio::test]
async fn repeated_gets_are_idempotent_for_session_state() {
    let site = common::scratch_site();
    let addr = common::start_gateway(base_config(), &site).await;
    let client = common::client();

    let first = client.get(format!("http://{addr}/page.html")).send().await.unwrap();
    let pair = common::session_cookie(&first).unwrap();
    let token = first.headers()["x-csrf-token"].to_str().unwrap().to_string();

    for _ in 0..3 {
        let repeat = client
            .get(format!("http://{addr}/page.html"))
            .header(reqwest::header::COOKIE, &pair)
            .send()
            .await
            .unwrap();
        assert_eq!(repeat.status(), StatusCode::OK);
        assert!(repeat.headers().get(reqwest::header::SET_COOKIE).is_none());
        assert_eq!(
            repeat.headers()["x-csrf-token"].to_str().unwrap(),
            token,
            "CSRF token must not rotate on safe requests"
        );
    }
}
