//! Role resolution
//!
//! The role is never trusted from the credential. Every role-gated request
//! reads it fresh from the user store, so a role change takes effect on the
//! very next request.

use std::sync::Arc;

use super::jwt::IdentityClaim;
use crate::store::UserStore;
use crate::types::AppError;

/// Why no role could be resolved
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No user record for the credential's email
    #[error("no user record for {0}")]
    NotFound(String),
    /// The store failed
    #[error("user store failed: {0}")]
    Store(#[from] AppError),
}

/// Maps a verified identity to the role currently persisted for it
#[derive(Clone)]
pub struct RoleResolver {
    users: Arc<dyn UserStore>,
}

impl RoleResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Current role string for the claim's email, verbatim
    pub async fn resolve(&self, claim: &IdentityClaim) -> Result<String, ResolveError> {
        match self.users.find_by_email(&claim.email).await? {
            Some(user) => Ok(user.role),
            None => Err(ResolveError::NotFound(claim.email.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::UserDoc;
    use crate::store::MemoryUserStore;

    fn claim(email: &str) -> IdentityClaim {
        IdentityClaim {
            sub: email.into(),
            email: email.into(),
            iat: 0,
            exp: u64::MAX,
        }
    }

    #[tokio::test]
    async fn test_resolves_current_role() {
        let store = Arc::new(MemoryUserStore::new());
        store.insert(UserDoc::new("a@x.com", "A")).await.unwrap();
        let resolver = RoleResolver::new(store.clone());

        assert_eq!(resolver.resolve(&claim("a@x.com")).await.unwrap(), "user");

        store.set_role_by_email("a@x.com", "admin").await.unwrap();
        assert_eq!(resolver.resolve(&claim("a@x.com")).await.unwrap(), "admin");
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let resolver = RoleResolver::new(Arc::new(MemoryUserStore::new()));
        let err = resolver.resolve(&claim("ghost@x.com")).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(email) if email == "ghost@x.com"));
    }
}
