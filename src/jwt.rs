//! JWT token generation and validation.
//!
//! Two token classes are signed with separate secrets. A token belongs to
//! the class whose secret verifies it; nothing in the payload says which.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed issuer written into and required from every token.
pub const ISSUER: &str = "blog-api";

/// Access token duration: 1 day
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 24 * 60 * 60;

/// Refresh token duration: 30 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Claims carried by both token classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer, always [`ISSUER`]
    pub iss: String,
    /// Subject (user id, stringified)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique token id
    pub jti: String,
}

/// The validated form of a token. Only produced by successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub subject: i64,
    pub name: String,
    pub email: String,
    pub issuer: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub token_id: String,
}

impl TryFrom<TokenClaims> for DecodedToken {
    type Error = JwtError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        if claims.iss != ISSUER {
            return Err(JwtError::Malformed);
        }
        let subject = claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(JwtError::Malformed)?;

        Ok(Self {
            subject,
            name: claims.name,
            email: claims.email,
            issuer: claims.iss,
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_id: claims.jti,
        })
    }
}

/// Result of signing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Access,
    Refresh,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Token service holding one key pair per token class.
#[derive(Clone)]
pub struct JwtConfig {
    access: SigningKeys,
    refresh: SigningKeys,
}

impl JwtConfig {
    /// Create a token service. The two secrets must differ.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Result<Self, JwtError> {
        if access_secret == refresh_secret {
            return Err(JwtError::SharedSecret);
        }
        Ok(Self {
            access: SigningKeys::from_secret(access_secret),
            refresh: SigningKeys::from_secret(refresh_secret),
        })
    }

    fn keys(&self, class: TokenClass) -> &SigningKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Generate an access token valid for [`ACCESS_TOKEN_DURATION_SECS`].
    pub fn generate_access_token(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now_secs()? + ACCESS_TOKEN_DURATION_SECS;
        self.generate_access_token_until(user_id, name, email, expires_at)
    }

    /// Generate an access token with an explicit expiry.
    pub fn generate_access_token_until(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
        expires_at: u64,
    ) -> Result<IssuedToken, JwtError> {
        self.sign(TokenClass::Access, user_id, name, email, expires_at)
    }

    /// Generate a refresh token valid for [`REFRESH_TOKEN_DURATION_SECS`].
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now_secs()? + REFRESH_TOKEN_DURATION_SECS;
        self.generate_refresh_token_until(user_id, name, email, expires_at)
    }

    /// Generate a refresh token with an explicit expiry.
    pub fn generate_refresh_token_until(
        &self,
        user_id: i64,
        name: &str,
        email: &str,
        expires_at: u64,
    ) -> Result<IssuedToken, JwtError> {
        self.sign(TokenClass::Refresh, user_id, name, email, expires_at)
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<DecodedToken, JwtError> {
        self.verify(TokenClass::Access, token)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<DecodedToken, JwtError> {
        self.verify(TokenClass::Refresh, token)
    }

    fn sign(
        &self,
        class: TokenClass,
        user_id: i64,
        name: &str,
        email: &str,
        expires_at: u64,
    ) -> Result<IssuedToken, JwtError> {
        let claims = TokenClaims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            iat: now_secs()?,
            exp: expires_at,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(class).encoding,
        )
        .map_err(JwtError::Encoding)?;

        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, class: TokenClass, token: &str) -> Result<DecodedToken, JwtError> {
        // Expiry is reported on its own, even when the signature would also fail.
        let unverified = peek_claims(token)?;
        if unverified.exp <= now_secs()? {
            return Err(JwtError::Expired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.keys(class).decoding, &validation)
                .map_err(JwtError::from_decoding)?;

        DecodedToken::try_from(token_data.claims)
    }
}

/// Read the payload segment without checking the signature.
fn peek_claims(token: &str) -> Result<TokenClaims, JwtError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| JwtError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| JwtError::Malformed)
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Token is not a well-formed JWT, or its claims are unacceptable
    Malformed,
    /// Signature does not match this token class's secret
    InvalidSignature,
    /// Token is past its expiry
    Expired,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Access and refresh secrets are identical
    SharedSecret,
    /// System time error
    TimeError,
}

impl JwtError {
    fn from_decoding(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Malformed,
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Malformed => write!(f, "Malformed token"),
            JwtError::InvalidSignature => write!(f, "Invalid token signature"),
            JwtError::Expired => write!(f, "Token expired"),
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::SharedSecret => {
                write!(f, "Access and refresh tokens must use different secrets")
            }
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
