//! Request-scoped identity types.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::directory::DirectoryUser;
use crate::jwt::DecodedToken;

/// Marker authority held by every principal resolved from a token.
pub const BEARER_AUTHORITY: &str = "BEARER";

/// Unauthenticated wrapper around a verified token, handed to the resolver.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: DecodedToken,
}

impl Credentials {
    pub fn new(token: DecodedToken) -> Self {
        Self { token }
    }

    /// The user id the token was issued for.
    pub fn user_id(&self) -> i64 {
        self.token.subject
    }
}

/// The resolved identity of the caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub authorities: BTreeSet<String>,
    /// Credentials the principal was resolved from, kept for audit logging
    pub credentials: Credentials,
}

impl Principal {
    /// Build a principal from a directory record. Authorities are the role
    /// names, the permission types reachable from those roles, and
    /// [`BEARER_AUTHORITY`].
    pub fn from_user(user: DirectoryUser, credentials: Credentials) -> Self {
        let mut authorities = BTreeSet::new();
        for role in &user.roles {
            authorities.insert(role.name.clone());
            for permission in &role.permissions {
                authorities.insert(permission.kind.clone());
            }
        }
        authorities.insert(BEARER_AUTHORITY.to_string());

        Self {
            id: user.id,
            display_name: user.name,
            email: user.email,
            authorities,
            credentials,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// Security context of a single request, stored in the request extensions.
///
/// Filters replace it wholesale; it is never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Arc<Principal>>,
}

impl SecurityContext {
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(Arc::new(principal)),
        }
    }

    /// An empty context.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&Arc<Principal>> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
