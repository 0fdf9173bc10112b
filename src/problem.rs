//! Problem-detail error bodies shared by the auth layer and the API.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::auth::request_path;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// JSON error body: `{type, title, status, timestamp, path, errorCode}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub error_code: &'static str,
}

impl Problem {
    pub fn new(status: StatusCode, error_code: &'static str) -> Self {
        Self {
            problem_type: "about:blank",
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: None,
            detail: None,
            error_code,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn body(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let mut response = (
            self.status_code(),
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            self.body(),
        )
            .into_response();
        // Kept so the outer layer can fill in the request path.
        response.extensions_mut().insert(self);
        response
    }
}

/// Middleware that stamps the request path into problem bodies produced
/// further down the stack.
pub async fn attach_problem_path(request: Request, next: Next) -> Response {
    let path = request_path(&request).to_string();
    let response = next.run(request).await;

    let Some(problem) = response
        .extensions()
        .get::<Problem>()
        .filter(|problem| problem.path.is_none())
        .cloned()
    else {
        return response;
    };

    let problem = Problem {
        path: Some(path),
        ..problem
    };
    let (mut parts, _body) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = Body::from(problem.body());
    parts.extensions.insert(problem);
    Response::from_parts(parts, body)
}
