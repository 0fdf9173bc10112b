pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod directory;
pub mod jwt;
pub mod password;
pub mod problem;
pub mod rate_limit;

use api::{AppState, create_api_router};
use auth::AccessRules;
use axum::Router;
use db::Database;
use jwt::{JwtConfig, JwtError};
use rate_limit::RateLimitConfig;
use std::num::NonZeroU32;
use std::sync::Arc;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens, must differ from `access_secret`
    pub refresh_secret: Vec<u8>,
    /// Login attempts allowed per client per minute (None disables limiting)
    pub login_rate_limit: Option<NonZeroU32>,
    /// Proxy header to read client IPs from (None uses the socket address)
    pub ip_extractor: Option<cli::IpExtractor>,
}

/// Create the application router with the given configuration.
/// Fails if the two token secrets are identical.
pub fn create_app(config: &ServerConfig) -> Result<Router, JwtError> {
    let jwt = Arc::new(JwtConfig::new(
        &config.access_secret,
        &config.refresh_secret,
    )?);

    let state = AppState {
        db: config.db.clone(),
        jwt,
    };
    let rate_limit = config
        .login_rate_limit
        .map(|per_minute| Arc::new(RateLimitConfig::new(per_minute, config.ip_extractor)));

    Ok(create_api_router(
        state,
        Arc::new(AccessRules::default_rules()),
        rate_limit,
    ))
}
