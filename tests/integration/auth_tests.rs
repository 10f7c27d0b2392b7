//! Authentication integration tests.
//!
//! Tests verify:
//! - Valid sessions work from the cookie or a bearer header
//! - Expired sessions are rejected
//! - Tampered and foreign-key sessions are rejected
//! - Malformed tokens are handled

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use photo_effects::SessionAuth;

use super::test_utils::{body_json, request, TestApp, ALICE};

fn list_with_cookie(cookie: &str) -> Request<Body> {
    request("GET", "/api/photo/", Some(cookie))
}

fn list_with_bearer(token: &str) -> Request<Body> {
    Request::get("/api/photo/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Valid Sessions
// =============================================================================

#[tokio::test]
async fn test_valid_cookie_succeeds() {
    let app = TestApp::new();
    let response = app.send(list_with_cookie(&app.session_cookie(ALICE))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_valid_bearer_token_succeeds() {
    let app = TestApp::new();
    let (token, _) = app
        .auth
        .issue(ALICE, Duration::from_secs(60))
        .unwrap();

    let response = app.send(list_with_bearer(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cookie_among_other_cookies() {
    let app = TestApp::new();
    let cookie = format!("theme=dark; {}; lang=en", app.session_cookie(ALICE));

    let response = app.send(list_with_cookie(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Rejected Sessions
// =============================================================================

#[tokio::test]
async fn test_missing_credentials() {
    let app = TestApp::new();
    let response = app.send(request("GET", "/api/photo/", None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "Authentication credentials were not provided."
    );
    assert_eq!(json["code"], "not_authenticated");
}

#[tokio::test]
async fn test_expired_session_rejected() {
    let app = TestApp::new();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let expiry = now - 10;
    let token = app.auth.issue_with_expiry(ALICE, expiry).unwrap();

    let response = app.send(list_with_bearer(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "session_expired");
}

#[tokio::test]
async fn test_tampered_user_rejected() {
    let app = TestApp::new();
    let (token, _) = app
        .auth
        .issue(ALICE, Duration::from_secs(60))
        .unwrap();
    let forged = token.replacen(ALICE, "mallory", 1);

    let response = app.send(list_with_bearer(&forged)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "invalid_session");
}

#[tokio::test]
async fn test_session_from_different_key_rejected() {
    let app = TestApp::new();
    let other = SessionAuth::new("a-completely-different-secret-key");
    let (token, _) = other
        .issue(ALICE, Duration::from_secs(60))
        .unwrap();

    let response = app.send(list_with_bearer(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_tokens_rejected() {
    let app = TestApp::new();

    for token in ["garbage", "alice:notanumber:abcd", "alice:123:not-hex", ":123:ab"] {
        let response = app.send(list_with_bearer(token)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "token: {}", token);

        let json = body_json(response).await;
        assert_eq!(json["code"], "malformed_session", "token: {}", token);
    }
}

#[tokio::test]
async fn test_non_bearer_authorization_ignored() {
    let app = TestApp::new();
    let request = Request::get("/api/photo/")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6cGFzcw==")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "not_authenticated");
}

// =============================================================================
// Public Routes
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_public() {
    let app = TestApp::new();
    let response = app.send(request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
