//! Axum extractors for the request security context.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::context::{Principal, SecurityContext};
use super::errors::AuthRejection;

/// Extractor for handlers that need the authenticated principal.
/// Rejects with 401 when the filters left the request unauthenticated.
pub struct CurrentPrincipal(pub Arc<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::principal)
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Optional variant - never fails.
pub struct OptionalPrincipal(pub Option<Arc<Principal>>);

impl<S> FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalPrincipal(
            parts
                .extensions
                .get::<SecurityContext>()
                .and_then(SecurityContext::principal)
                .cloned(),
        ))
    }
}
