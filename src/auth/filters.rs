//! Per-request token filters.
//!
//! Both filters fail open: a missing, malformed, expired or unresolvable
//! token leaves the request unauthenticated and lets it through. Only the
//! authorization gate turns a missing principal into a 401.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::context::{Credentials, SecurityContext};
use super::cookie::{REFRESH_COOKIE_NAME, get_cookie};
use super::resolver::{AuthError, authenticate};
use super::state::HasAuthBackend;
use crate::jwt::DecodedToken;

/// The one route on which the refresh cookie is honoured.
pub const TOKEN_ROUTE: &str = "/auth/token";

const BEARER_PREFIX: &str = "Bearer ";

/// Full request path, before any nesting stripped a prefix.
pub fn request_path(request: &Request) -> &str {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| request.uri().path())
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Give every request a fresh, empty security context.
pub async fn init_security_context(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(SecurityContext::cleared());
    next.run(request).await
}

/// Authenticate the request from a bearer access token.
pub async fn access_token_filter<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    if is_preflight(&request) || request_path(&request) == TOKEN_ROUTE {
        return next.run(request).await;
    }

    let already_authenticated = request
        .extensions()
        .get::<SecurityContext>()
        .is_some_and(SecurityContext::is_authenticated);
    if already_authenticated {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return next.run(request).await;
    };

    let context = match state.jwt().validate_access_token(&token) {
        Ok(decoded) => resolve(&state, decoded, "access").await,
        Err(e) => {
            debug!(error = %e, "Ignoring invalid access token");
            SecurityContext::cleared()
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Authenticate the token-renewal route from the refresh cookie.
pub async fn refresh_token_filter<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    if is_preflight(&request) || request_path(&request) != TOKEN_ROUTE {
        return next.run(request).await;
    }

    let Some(token) = get_cookie(request.headers(), REFRESH_COOKIE_NAME).map(str::to_string)
    else {
        return next.run(request).await;
    };

    let context = match state.jwt().validate_refresh_token(&token) {
        Ok(decoded) => resolve(&state, decoded, "refresh").await,
        Err(e) => {
            debug!(error = %e, "Ignoring invalid refresh token");
            SecurityContext::cleared()
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

async fn resolve<S: HasAuthBackend>(
    state: &S,
    decoded: DecodedToken,
    source: &'static str,
) -> SecurityContext {
    match authenticate(state.directory(), Credentials::new(decoded)).await {
        Ok(principal) => {
            debug!(user_id = principal.id, source, "Authenticated request");
            SecurityContext::authenticated(principal)
        }
        Err(e @ AuthError::UserNotFound(_)) => {
            debug!(error = %e, source, "Token subject not found");
            SecurityContext::cleared()
        }
        Err(e @ AuthError::Directory(_)) => {
            warn!(error = %e, source, "Failed to resolve token subject");
            SecurityContext::cleared()
        }
    }
}
