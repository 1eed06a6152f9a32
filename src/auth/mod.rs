//! Authentication and authorization for bloodline
//!
//! Provides:
//! - Session credential issuing and verification (JWT in an HTTP-only cookie)
//! - Roles and ordered access levels
//! - Role resolution from the user store
//! - The access gate protected endpoints go through

pub mod cookie;
pub mod gate;
pub mod jwt;
pub mod permissions;
pub mod resolver;

pub use cookie::{cleared_session_cookie, session_cookie, session_token, SESSION_COOKIE};
pub use gate::{AccessGate, Admission, Denial};
pub use jwt::{CredentialError, IdentityClaim, IdentityInput, IssuedCredential, SessionTokens};
pub use permissions::{AccessLevel, Role};
pub use resolver::{ResolveError, RoleResolver};
