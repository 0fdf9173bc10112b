//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::{FORBIDDEN_CODE, extract_client_ip};
use crate::cli::IpExtractor;
use crate::problem::Problem;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for the login endpoint.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login attempts
    pub login: Arc<IpLimiter>,
    /// Where client IPs come from (None uses the socket address)
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    /// Allow `per_minute` login attempts per client, with the full amount available as burst.
    pub fn new(per_minute: NonZeroU32, ip_extractor: Option<IpExtractor>) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            ip_extractor,
        }
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, config.ip_extractor.as_ref()) {
        Ok(ip) => ip,
        Err(reason) => {
            warn!(reason, "Unable to determine client IP");
            return Problem::new(StatusCode::FORBIDDEN, FORBIDDEN_CODE)
                .with_detail("Unable to determine client IP.")
                .into_response();
        }
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Login rate limit exceeded");
            Problem::new(StatusCode::TOO_MANY_REQUESTS, "REQ_429")
                .with_detail("Too many login attempts. Please wait before trying again.")
                .into_response()
        }
    }
}
