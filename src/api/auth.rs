//! Authentication API endpoints.
//!
//! - POST `/auth/login` - Exchange email + password for an access token and refresh cookie
//! - GET `/auth/token` - Mint a new access token from the refresh cookie
//! - POST `/auth/logout` - Clear the refresh cookie
//! - GET `/auth/me` - Describe the current principal

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::{
    CurrentPrincipal, OptionalPrincipal, TOKEN_ROUTE, clear_refresh_cookie, refresh_cookie,
};
use crate::directory::UserDirectory;
use crate::jwt::JwtError;
use crate::password::{verify_dummy_password, verify_password};
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

pub fn router(rate_limit: Option<Arc<RateLimitConfig>>) -> Router<AppState> {
    let login_router = Router::new().route("/auth/login", post(login));
    let login_router = match rate_limit {
        Some(config) => {
            login_router.route_layer(middleware::from_fn_with_state(config, rate_limit_login))
        }
        None => login_router,
    };

    Router::new()
        .merge(login_router)
        .route(TOKEN_ROUTE, get(renew_access_token))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct MeResponse {
    id: i64,
    name: String,
    email: String,
    authorities: Vec<String>,
}

fn token_error(e: JwtError) -> ApiError {
    error!(error = %e, "Failed to generate token");
    ApiError::internal("Failed to generate token")
}

fn bad_credentials() -> ApiError {
    ApiError::unauthorized("Bad credentials")
}

/// Verify the password, then issue an access token in the body and a
/// refresh token in an HttpOnly cookie.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let user = state
        .db
        .load_by_email(&request.email)
        .await
        .db_err("Failed to load user")?;

    let password = request.password;
    let hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => Ok(verify_dummy_password(&password)),
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Password verification task failed");
        ApiError::internal("Password verification failed")
    })?;

    let Some(user) = user else {
        debug!("Login attempt for unknown email");
        return Err(bad_credentials());
    };

    match verified {
        Ok(true) => {}
        Ok(false) => {
            debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(bad_credentials());
        }
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Stored password hash is unusable");
            return Err(bad_credentials());
        }
    }

    let access = state
        .jwt
        .generate_access_token(user.id, &user.name, &user.email)
        .map_err(token_error)?;
    let refresh = state
        .jwt
        .generate_refresh_token(user.id, &user.name, &user.email)
        .map_err(token_error)?;

    info!(user_id = user.id, "User logged in");

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, refresh_cookie(&refresh.token))],
        Json(TokenResponse {
            access_token: access.token,
        }),
    ))
}

/// Issue a fresh access token. Only the refresh filter can authenticate
/// this route, so the principal here always comes from the refresh cookie.
async fn renew_access_token(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    let access = state
        .jwt
        .generate_access_token(principal.id, &principal.display_name, &principal.email)
        .map_err(token_error)?;

    debug!(user_id = principal.id, "Renewed access token");

    Ok(Json(TokenResponse {
        access_token: access.token,
    }))
}

/// Clear the refresh cookie. Refresh tokens are stateless, so there is
/// nothing to revoke server-side.
async fn logout(OptionalPrincipal(principal): OptionalPrincipal) -> impl IntoResponse {
    if let Some(principal) = principal {
        info!(user_id = principal.id, "User logged out");
    }

    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_refresh_cookie())],
    )
}

async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> impl IntoResponse {
    Json(MeResponse {
        id: principal.id,
        name: principal.display_name.clone(),
        email: principal.email.clone(),
        authorities: principal.authorities.iter().cloned().collect(),
    })
}
