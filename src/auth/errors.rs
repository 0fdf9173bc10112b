//! Authorization rejections produced by the gate and the principal extractor.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::problem::Problem;

/// Error code for requests without an authenticated principal.
pub const UNAUTHORIZED_CODE: &str = "AUTH_401";

/// Error code for principals lacking a required authority.
pub const FORBIDDEN_CODE: &str = "AUTH_403";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    NotAuthenticated,
    InsufficientAuthority,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::NotAuthenticated => {
                Problem::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_CODE)
            }
            AuthRejection::InsufficientAuthority => {
                Problem::new(StatusCode::FORBIDDEN, FORBIDDEN_CODE)
            }
        }
        .into_response()
    }
}
