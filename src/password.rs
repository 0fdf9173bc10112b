//! Password hashing and verification using Argon2id.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel
//! with the hash and no separate storage is needed.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash checked when the account does not exist, so unknown emails cost the
/// same Argon2 work as known ones.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("blog-api-dummy-password").ok());

/// Password hashing and verification errors.
#[derive(Debug)]
pub enum PasswordError {
    HashingFailed(String),
    InvalidHashFormat,
    VerificationFailed(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::HashingFailed(e) => write!(f, "Failed to hash password: {}", e),
            PasswordError::InvalidHashFormat => write!(f, "Invalid password hash format"),
            PasswordError::VerificationFailed(e) => write!(f, "Failed to verify password: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check a plaintext password against a stored PHC hash.
/// Returns `Ok(false)` on mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Run a full verification against a throwaway hash. Always returns false.
pub fn verify_dummy_password(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}
