//! Session credential issuing and verification
//!
//! Credentials are HS256-signed JWTs carrying an [`IdentityClaim`]. They are
//! stateless: nothing is stored server side, so a credential stays valid until
//! it expires or the client drops the cookie.
//!
//! Security notes:
//! - Default expiry is 365 days
//! - The secret must be at least 32 characters outside dev mode
//! - The role is NOT embedded; it is resolved from the user store per request

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::MIN_SECRET_LEN;
use crate::types::AppError;

/// Payload stored in the session credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Subject identifier (external uid when supplied, otherwise the email)
    pub sub: String,
    /// User email, the join key into the user store
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity object supplied by the client when requesting a credential.
///
/// Authenticity of this identity is established by an external login flow
/// before `/jwt` is called; no existence check is made here.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityInput {
    pub email: String,
    #[serde(default, alias = "uid", alias = "_id")]
    pub id: Option<String>,
}

/// A freshly signed credential
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub claim: IdentityClaim,
}

/// Why a presented credential was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No credential was presented
    #[error("missing credential")]
    Missing,
    /// Bad signature, malformed token or expired
    #[error("invalid credential: {0}")]
    Invalid(String),
}

/// Credential issuer and verifier
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl SessionTokens {
    /// Create a new issuer/verifier
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str, ttl_seconds: u64) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Config(
                "ACCESS_TOKEN_SECRET is required to issue credentials".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "ACCESS_TOKEN_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        })
    }

    /// Credential lifetime in seconds
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Sign a credential for the given identity
    pub fn issue(&self, identity: &IdentityInput) -> Result<IssuedCredential, AppError> {
        let now = unix_now()?;
        let email = identity.email.trim().to_string();

        let claim = IdentityClaim {
            sub: identity
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| email.clone()),
            email,
            iat: now,
            exp: now + self.ttl_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claim, &self.encoding)
            .map_err(|e| AppError::Auth(format!("Failed to sign credential: {}", e)))?;

        Ok(IssuedCredential { token, claim })
    }

    /// Verify a raw credential.
    ///
    /// Purely cryptographic, never touches the store.
    pub fn verify(&self, raw: Option<&str>) -> Result<IdentityClaim, CredentialError> {
        let token = match raw.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(CredentialError::Missing),
        };

        let validation = Validation::new(Algorithm::HS256);

        match decode::<IdentityClaim>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    _ => "Token validation failed",
                };
                Err(CredentialError::Invalid(reason.to_string()))
            }
        }
    }
}

fn unix_now() -> Result<u64, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AppError::Internal(format!("System time error: {}", e)))
}
