//! Bearer-token authentication with authority-gated routes.
//!
//! Dual-token system: access tokens (1 day) travel in the `Authorization`
//! header, refresh tokens (30 days) in an HttpOnly cookie that is only
//! honoured on the token-renewal route. Filters populate a per-request
//! [`SecurityContext`]; the [`gate`] decides 401/403/pass-through.

mod context;
mod cookie;
mod errors;
mod extractors;
mod filters;
pub mod gate;
mod ip;
mod resolver;
mod state;

pub use context::{BEARER_AUTHORITY, Credentials, Principal, SecurityContext};
pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::{AuthRejection, FORBIDDEN_CODE, UNAUTHORIZED_CODE};
pub use extractors::{CurrentPrincipal, OptionalPrincipal};
pub use filters::{
    TOKEN_ROUTE, access_token_filter, bearer_token, init_security_context, refresh_token_filter,
    request_path,
};
pub use gate::{ADMIN_AUTHORITY, AccessRules, Decision, Requirement, RoutePattern, authorize};
pub use ip::{UNKNOWN_CLIENT, extract_client_ip};
pub use resolver::{AuthError, authenticate};
pub use state::HasAuthBackend;
