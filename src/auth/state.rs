//! Authentication state traits and macro.

use crate::directory::UserDirectory;
use crate::jwt::JwtConfig;

/// Trait for state types that provide a token service and a user directory.
pub trait HasAuthBackend {
    type Directory: UserDirectory;

    fn jwt(&self) -> &JwtConfig;
    fn directory(&self) -> &Self::Directory;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `jwt: Arc<JwtConfig>`
/// - `db: Database`
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// pub struct MyState {
///     pub db: Database,
///     pub jwt: Arc<JwtConfig>,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            type Directory = $crate::db::Database;

            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn directory(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}
