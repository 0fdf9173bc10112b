//! Tests for the login endpoint.
//!
//! Tests cover:
//! - Successful login issues an access token and a refresh cookie
//! - Bad credentials are rejected with 401 and no cookie
//! - Malformed request bodies
//! - Per-client rate limiting

mod common;

use axum::{extract::ConnectInfo, http::StatusCode};
use blog_api::auth::REFRESH_COOKIE_NAME;
use blog_api::cli::{ClientIpHeader, IpExtractor};
use common::*;
use std::net::SocketAddr;
use tower::ServiceExt;

#[tokio::test]
async fn test_login_success() {
    let t = create_test_app().await;
    let id = create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .oneshot(login_request("alice@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = extract_set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with(&format!("{}=", REFRESH_COOKIE_NAME)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=2592000"));

    let json = body_json(response).await;
    let access_token = json["accessToken"].as_str().unwrap();
    assert!(!access_token.trim().is_empty());

    let decoded = t.jwt.validate_access_token(access_token).unwrap();
    assert_eq!(decoded.subject, id);
    assert_eq!(decoded.name, "Alice");
    assert_eq!(decoded.email, "alice@example.com");
    assert_eq!(decoded.issuer, "blog-api");

    let refresh_token = cookie_pair(cookie)
        .split_once('=')
        .map(|(_, value)| value.to_string())
        .unwrap();
    let refresh = t.jwt.validate_refresh_token(&refresh_token).unwrap();
    assert_eq!(refresh.subject, id);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let t = create_test_app().await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .oneshot(login_request("ALICE@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let t = create_test_app().await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .oneshot(login_request("alice@example.com", "not the password"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(extract_set_cookies(&response).is_empty());

    let json = body_json(response).await;
    assert_problem(&json, 401, "AUTH_401", "/auth/login");
    assert_eq!(json["title"], "Unauthorized");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let t = create_test_app().await;

    let response = t
        .app
        .oneshot(login_request("nobody@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(extract_set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_login_with_unusable_stored_hash() {
    let t = create_test_app().await;
    t.db.users()
        .create("Broken", "broken@example.com", "not-a-phc-string")
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(login_request("broken@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_missing_field() {
    let t = create_test_app().await;

    let response = t
        .app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(r#"{"email": "alice@example.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errorCode"], "REQ_400");
}

#[tokio::test]
async fn test_login_rate_limited() {
    let t = create_test_app_with_rate_limit(Some(2)).await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    for _ in 0..2 {
        let response = t
            .app
            .clone()
            .oneshot(login_request("alice@example.com", "wrong"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = t
        .app
        .clone()
        .oneshot(login_request("alice@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["errorCode"], "REQ_429");
    assert_eq!(json["path"], "/auth/login");
}

fn login_from(addr: [u8; 4], forwarded_for: &str) -> axum::http::Request<axum::body::Body> {
    let mut request = login_request("alice@example.com", PASSWORD);
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((addr, 4000))));
    request
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let t = create_test_app_with_rate_limit(Some(1)).await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 1], "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 2], "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_limit() {
    let t = create_test_app_with_rate_limit(Some(2)).await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    for i in 0..2 {
        let response = t
            .app
            .clone()
            .oneshot(login_from([192, 0, 2, 1], &format!("10.0.0.{}", i)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 1], "10.0.0.99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_configured_ip_header_keys_the_limit() {
    let t = create_test_app_with_ip_extractor(
        Some(1),
        Some(IpExtractor::from(ClientIpHeader::XForwardFor)),
    )
    .await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 1], "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 1], "203.0.113.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(login_from([192, 0, 2, 1], "203.0.113.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_configured_ip_header_missing_is_rejected() {
    let t = create_test_app_with_ip_extractor(
        Some(5),
        Some(IpExtractor::from(ClientIpHeader::XRealIp)),
    )
    .await;
    create_user(&t.db, "Alice", "alice@example.com").await;

    let response = t
        .app
        .oneshot(login_request("alice@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_problem(&json, 403, "AUTH_403", "/auth/login");
}
