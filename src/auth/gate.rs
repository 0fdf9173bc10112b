//! Authorization gate: a route table mapping `(method, path)` to a
//! requirement, evaluated after the token filters have run.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::context::SecurityContext;
use super::errors::AuthRejection;
use super::filters::{TOKEN_ROUTE, request_path};

/// Authority required by the user administration routes.
pub const ADMIN_AUTHORITY: &str = "ADMIN";

/// What a route demands from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Authority(String),
}

/// Outcome of evaluating a requirement against a security context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject(AuthRejection),
}

impl Requirement {
    pub fn evaluate(&self, context: &SecurityContext) -> Decision {
        match self {
            Requirement::Public => Decision::Allow,
            Requirement::Authenticated if context.is_authenticated() => Decision::Allow,
            Requirement::Authority(authority) => match context.principal() {
                None => Decision::Reject(AuthRejection::NotAuthenticated),
                Some(principal) if principal.has_authority(authority) => Decision::Allow,
                Some(_) => Decision::Reject(AuthRejection::InsufficientAuthority),
            },
            Requirement::Authenticated => Decision::Reject(AuthRejection::NotAuthenticated),
        }
    }
}

static FALLBACK_REQUIREMENT: Requirement = Requirement::Authenticated;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Wildcard,
}

/// Route pattern with literal segments, `{param}` segments and an optional
/// trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl RoutePattern {
    pub fn new(pattern: &str) -> Self {
        let segments = path_segments(pattern)
            .map(|segment| {
                if segment == "*" {
                    Segment::Wildcard
                } else if segment.starts_with('{') && segment.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path_segments(path);
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return true,
                Segment::Param => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

/// HEAD is served by GET handlers, so GET rules cover it too.
fn method_matches(rule_method: &Method, method: &Method) -> bool {
    rule_method == method || (rule_method == Method::GET && method == Method::HEAD)
}

/// One entry of the route table. `method: None` matches any method.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub method: Option<Method>,
    pub pattern: RoutePattern,
    pub requirement: Requirement,
}

/// Ordered route table; the first matching rule wins and unmatched routes
/// require an authenticated caller.
#[derive(Debug, Clone, Default)]
pub struct AccessRules {
    rules: Vec<AccessRule>,
}

impl AccessRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        self.rules.push(AccessRule {
            method,
            pattern: RoutePattern::new(pattern),
            requirement,
        });
        self
    }

    pub fn public(self, method: Method, pattern: &str) -> Self {
        self.rule(Some(method), pattern, Requirement::Public)
    }

    pub fn authenticated(self, method: Method, pattern: &str) -> Self {
        self.rule(Some(method), pattern, Requirement::Authenticated)
    }

    pub fn authority(self, method: Method, pattern: &str, authority: &str) -> Self {
        self.rule(
            Some(method),
            pattern,
            Requirement::Authority(authority.to_string()),
        )
    }

    /// The table used by the server.
    pub fn default_rules() -> Self {
        Self::new()
            .public(Method::POST, "/auth/login")
            .public(Method::POST, "/auth/logout")
            .authenticated(Method::GET, TOKEN_ROUTE)
            .authenticated(Method::GET, "/auth/me")
            .authority(Method::GET, "/users/{id}", ADMIN_AUTHORITY)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn requirement_for(&self, method: &Method, path: &str) -> &Requirement {
        self.rules
            .iter()
            .find(|rule| {
                rule.method
                    .as_ref()
                    .is_none_or(|m| method_matches(m, method))
                    && rule.pattern.matches(path)
            })
            .map(|rule| &rule.requirement)
            .unwrap_or(&FALLBACK_REQUIREMENT)
    }
}

/// Middleware enforcing the route table.
pub async fn authorize(
    State(rules): State<Arc<AccessRules>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let decision = {
        let context = request.extensions().get::<SecurityContext>();
        let requirement = rules.requirement_for(request.method(), request_path(&request));
        match context {
            Some(context) => requirement.evaluate(context),
            None => requirement.evaluate(&SecurityContext::cleared()),
        }
    };

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Reject(rejection) => {
            debug!(
                method = %request.method(),
                path = request_path(&request),
                ?rejection,
                "Request rejected by authorization gate"
            );
            rejection.into_response()
        }
    }
}
