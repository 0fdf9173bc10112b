//! User directory seam consumed by the authentication resolver.

use std::future::Future;

/// A permission granted through a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// Permission type, used verbatim as an authority
    pub kind: String,
}

/// A role and the permissions it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<Permission>,
}

/// A user as known to the directory.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub roles: Vec<Role>,
}

/// Looks users up by id or email.
///
/// Implementations may block on storage. Errors are not retried.
pub trait UserDirectory: Send + Sync {
    fn load_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<DirectoryUser>, sqlx::Error>> + Send;

    fn load_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<DirectoryUser>, sqlx::Error>> + Send;
}
