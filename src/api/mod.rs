mod auth;
mod error;
mod users;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::auth::{
    AccessRules, access_token_filter, authorize, init_security_context, refresh_token_filter,
};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::problem::attach_problem_path;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(AppState);

/// Create the API router.
///
/// Request flow: fresh security context, refresh filter, access filter,
/// authorization gate, handler.
pub fn create_api_router(
    state: AppState,
    rules: Arc<AccessRules>,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    Router::new()
        .merge(auth::router(rate_limit))
        .merge(users::router())
        .route_layer(middleware::from_fn_with_state(rules, authorize))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access_token_filter::<AppState>,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            refresh_token_filter::<AppState>,
        ))
        .route_layer(middleware::from_fn(init_security_context))
        .layer(middleware::from_fn(attach_problem_path))
        .with_state(state)
}
