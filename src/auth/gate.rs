//! Access gate
//!
//! Every protected endpoint declares an [`AccessLevel`]. The gate checks the
//! credential first and consults the role resolver only for levels that need
//! a role, so role lookups never happen for missing or invalid credentials.

use hyper::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use super::cookie::session_token;
use super::jwt::{CredentialError, IdentityClaim, SessionTokens};
use super::permissions::AccessLevel;
use super::resolver::{ResolveError, RoleResolver};

/// A request that passed the gate
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Verified identity, absent for anonymous endpoints
    pub claim: Option<IdentityClaim>,
    /// Resolved role, present only when the level required one
    pub role: Option<String>,
}

/// Why a request was turned away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No credential presented
    Unauthenticated,
    /// Credential failed verification
    Invalid(String),
    /// Credential fine, role insufficient or unresolvable
    Unauthorized,
}

impl Denial {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Denial::Unauthenticated => StatusCode::UNAUTHORIZED,
            Denial::Invalid(_) => StatusCode::FORBIDDEN,
            Denial::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => "unauthorized access",
            Denial::Invalid(_) => "forbidden access",
            Denial::Unauthorized => "unauthorized",
        }
    }
}

/// Credential check plus role check, in that order
#[derive(Clone)]
pub struct AccessGate {
    tokens: SessionTokens,
    resolver: RoleResolver,
}

impl AccessGate {
    pub fn new(tokens: SessionTokens, resolver: RoleResolver) -> Self {
        Self { tokens, resolver }
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Admit or deny a request for the given level
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        required: AccessLevel,
    ) -> Result<Admission, Denial> {
        if required == AccessLevel::Anonymous {
            return Ok(Admission {
                claim: None,
                role: None,
            });
        }

        let claim = match self.tokens.verify(session_token(headers)) {
            Ok(claim) => claim,
            Err(CredentialError::Missing) => {
                debug!("No session credential presented");
                return Err(Denial::Unauthenticated);
            }
            Err(CredentialError::Invalid(reason)) => {
                warn!("Rejected credential: {}", reason);
                return Err(Denial::Invalid(reason));
            }
        };

        if !required.needs_role() {
            return Ok(Admission {
                claim: Some(claim),
                role: None,
            });
        }

        let role = match self.resolver.resolve(&claim).await {
            Ok(role) => role,
            Err(ResolveError::NotFound(email)) => {
                warn!("No user record for credential holder {}", email);
                return Err(Denial::Unauthorized);
            }
            Err(ResolveError::Store(err)) => {
                warn!("Role lookup failed for {}: {}", claim.email, err);
                return Err(Denial::Unauthorized);
            }
        };

        if AccessLevel::granted_by(&role) < required {
            warn!(
                "Denied {} (role {}) at level {}",
                claim.email, role, required
            );
            return Err(Denial::Unauthorized);
        }

        Ok(Admission {
            claim: Some(claim),
            role: Some(role),
        })
    }
}
