use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

use super::AppState;
use super::error::{ApiError, ResultExt};

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}", get(get_user))
}

#[derive(Serialize)]
struct UserResponse {
    id: i64,
    name: String,
    email: String,
    roles: Vec<String>,
}

/// Look up any user by id. Gated on the admin authority.
async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid user id"))?;

    let user = state
        .db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        roles: user.roles.into_iter().map(|role| role.name).collect(),
    }))
}
