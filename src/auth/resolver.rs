//! Resolves verified credentials into a principal via the user directory.

use super::context::{Credentials, Principal};
use crate::directory::UserDirectory;

/// Why a verified token could not be turned into a principal.
#[derive(Debug)]
pub enum AuthError {
    /// No user exists for the token's subject
    UserNotFound(i64),
    /// The directory lookup itself failed
    Directory(sqlx::Error),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::UserNotFound(id) => write!(f, "User {} not found", id),
            AuthError::Directory(e) => write!(f, "Directory lookup failed: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

/// Look the subject up and derive its authorities. Nothing is cached; every
/// call hits the directory.
pub async fn authenticate<D: UserDirectory>(
    directory: &D,
    credentials: Credentials,
) -> Result<Principal, AuthError> {
    let user_id = credentials.user_id();
    let user = directory
        .load_by_id(user_id)
        .await
        .map_err(AuthError::Directory)?
        .ok_or(AuthError::UserNotFound(user_id))?;

    Ok(Principal::from_user(user, credentials))
}
