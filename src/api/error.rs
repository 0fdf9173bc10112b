//! Shared error handling for API endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::UNAUTHORIZED_CODE;
use crate::problem::Problem;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "{}", context);
        Self::Internal("Database error".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "REQ_400", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_CODE, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "REQ_404", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "SRV_500", msg),
        };
        Problem::new(status, code).with_detail(message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_err_hides_storage_detail() {
        let result: Result<(), String> = Err("disk I/O error".to_string());

        match result.db_err("Failed to load user") {
            Err(ApiError::Internal(msg)) => assert_eq!(msg, "Database error"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_is_a_problem() {
        let response = ApiError::not_found("User not found").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let problem = response.extensions().get::<Problem>().unwrap();
        assert_eq!(problem.error_code, "REQ_404");
        assert_eq!(problem.detail.as_deref(), Some("User not found"));
    }
}
