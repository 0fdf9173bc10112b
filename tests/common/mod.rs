#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use blog_api::{
    ServerConfig,
    cli::{IpExtractor, grant_admin},
    create_app,
    db::Database,
    jwt::JwtConfig,
    password::hash_password,
};
use std::num::NonZeroU32;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-for-integration-tests";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-for-integration-tests";

pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

/// Create a test app without login rate limiting.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_rate_limit(None).await
}

pub async fn create_test_app_with_rate_limit(login_rate_limit: Option<u32>) -> TestApp {
    create_test_app_with_ip_extractor(login_rate_limit, None).await
}

pub async fn create_test_app_with_ip_extractor(
    login_rate_limit: Option<u32>,
    ip_extractor: Option<IpExtractor>,
) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        login_rate_limit: login_rate_limit.and_then(NonZeroU32::new),
        ip_extractor,
    };
    let app = create_app(&config).expect("Failed to create app");
    let jwt = JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET).expect("Invalid secrets");
    TestApp { app, db, jwt }
}

/// Create a user with [`PASSWORD`]. Returns the user id.
pub async fn create_user(db: &Database, name: &str, email: &str) -> i64 {
    let hash = hash_password(PASSWORD).expect("Failed to hash password");
    db.users()
        .create(name, email, &hash)
        .await
        .expect("Failed to create user")
}

/// Create a user holding the admin role. Returns the user id.
pub async fn create_admin(db: &Database, name: &str, email: &str) -> i64 {
    let id = create_user(db, name, email).await;
    grant_admin(db, id).await.expect("Failed to grant admin");
    id
}

pub fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Turn a Set-Cookie value into the `name=value` pair a client sends back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Check the problem-detail body of an auth rejection.
pub fn assert_problem(json: &serde_json::Value, status: u16, code: &str, path: &str) {
    assert_eq!(json["type"], "about:blank");
    assert_eq!(json["status"], status);
    assert_eq!(json["errorCode"], code);
    assert_eq!(json["path"], path);
    assert!(json["timestamp"].as_str().is_some());
}
