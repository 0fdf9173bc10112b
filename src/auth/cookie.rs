//! Refresh cookie parsing and construction.

use axum::http::{HeaderMap, header};

use crate::jwt::REFRESH_TOKEN_DURATION_SECS;

/// Cookie name for the refresh token (long-lived, 30 days).
pub const REFRESH_COOKIE_NAME: &str = "__Http-REFRESHTOKEN";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Set-Cookie value carrying a refresh token.
pub fn refresh_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        REFRESH_COOKIE_NAME, token, REFRESH_TOKEN_DURATION_SECS
    )
}

/// Set-Cookie value that removes the refresh cookie.
pub fn clear_refresh_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0",
        REFRESH_COOKIE_NAME
    )
}
