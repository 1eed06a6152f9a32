//! Role transitions and registration
//!
//! Three writes touch a user's role: registration (user or donator), the
//! self-service donator toggle, and the unconditional admin overwrite.

use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::Role;
use crate::db::schemas::UserDoc;
use crate::store::UserStore;
use crate::types::{AppError, Result};

/// Result of a self-service toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub email: String,
    pub previous: String,
    pub role: Role,
}

/// Flip the role of `email` between user and donator.
///
/// Anything that is not currently `donator`, admin included, becomes
/// `donator`.
pub async fn toggle_donator_role(users: &dyn UserStore, email: Option<&str>) -> Result<RoleChange> {
    let email = required(email, "Email is required")?;

    let user = users
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let role = Role::toggled(&user.role);
    if !users.set_role_by_email(email, role.as_str()).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!("Role of {} changed from {} to {}", email, user.role, role);

    Ok(RoleChange {
        email: email.to_string(),
        previous: user.role,
        role,
    })
}

/// Overwrite the role of the user with id `raw_id`.
///
/// With `canonical_only` unset any non-empty string is stored verbatim.
pub async fn set_role(
    users: &dyn UserStore,
    raw_id: &str,
    role: Option<&str>,
    canonical_only: bool,
) -> Result<()> {
    let id = ObjectId::parse_str(raw_id)?;
    let role = required(role, "Role is required")?;

    if canonical_only && Role::parse(role).is_none() {
        return Err(AppError::BadRequest(format!("Unknown role: {}", role)));
    }

    if Role::parse(role).is_none() {
        warn!("Storing non-canonical role {:?} for user {}", role, id);
    }

    if !users.set_role_by_id(id, role).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!("Role of user {} set to {}", id, role);
    Ok(())
}

/// Registration payload sent by the client after its external login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "contactNumber", alias = "contact_number")]
    pub contact_number: Option<String>,
    #[serde(default, rename = "photoURL", alias = "photo")]
    pub photo_url: Option<String>,
    /// Requested role; only `user` and `donator` are honoured
    #[serde(default)]
    pub role: Option<String>,
}

/// Outcome of [`register_or_fetch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created { id: ObjectId, user: UserDoc },
    Existing(UserDoc),
}

/// Insert a user unless one with the same email exists.
///
/// The new record gets the requested role when it is `user` or `donator`,
/// otherwise `default_role`. Admin is never granted here. Calling twice with the same email stores one record; the second call
/// reports `Existing`. A concurrent insert that loses the unique-email race
/// also reports `Existing`.
pub async fn register_or_fetch(
    users: &dyn UserStore,
    input: NewUser,
    default_role: Role,
) -> Result<Registration> {
    let email = required(input.email.as_deref(), "Email is required")?.to_string();

    if let Some(existing) = users.find_by_email(&email).await? {
        return Ok(Registration::Existing(existing));
    }

    let mut user = UserDoc::new(email.clone(), input.name.unwrap_or_default());
    user.contact_number = input.contact_number;
    user.photo_url = input.photo_url;
    user.role = initial_role(input.role.as_deref(), default_role)
        .as_str()
        .to_string();

    match users.insert(user.clone()).await {
        Ok(id) => {
            info!("Registered user {} as {}", email, user.role);
            user._id = Some(id);
            Ok(Registration::Created { id, user })
        }
        Err(AppError::Conflict(_)) => users
            .find_by_email(&email)
            .await?
            .map(Registration::Existing)
            .ok_or_else(|| AppError::Conflict("User already exists".into())),
        Err(e) => Err(e),
    }
}

fn initial_role(requested: Option<&str>, default_role: Role) -> Role {
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        None => default_role,
        Some(raw) => match Role::parse(raw) {
            Some(role @ (Role::User | Role::Donator)) => role,
            _ => {
                warn!("Ignoring requested registration role {:?}", raw);
                default_role
            }
        },
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    async fn store_with(email: &str, role: &str) -> (MemoryUserStore, ObjectId) {
        let store = MemoryUserStore::new();
        let id = store.insert(UserDoc::new(email, "")).await.unwrap();
        store.set_role_by_id(id, role).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_toggle_is_an_involution_on_user() {
        let (store, _) = store_with("a@x.com", "user").await;

        let first = toggle_donator_role(&store, Some("a@x.com")).await.unwrap();
        assert_eq!(first.role, Role::Donator);
        assert_eq!(first.previous, "user");

        let second = toggle_donator_role(&store, Some("a@x.com")).await.unwrap();
        assert_eq!(second.role, Role::User);
        assert_eq!(store.find_by_email("a@x.com").await.unwrap().unwrap().role, "user");
    }

    #[tokio::test]
    async fn test_toggle_turns_admin_into_donator() {
        let (store, _) = store_with("root@x.com", "admin").await;
        let change = toggle_donator_role(&store, Some("root@x.com")).await.unwrap();
        assert_eq!(change.role, Role::Donator);
    }

    #[tokio::test]
    async fn test_toggle_errors() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            toggle_donator_role(&store, None).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            toggle_donator_role(&store, Some("  ")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            toggle_donator_role(&store, Some("ghost@x.com")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_role_stores_any_string() {
        let (store, id) = store_with("a@x.com", "user").await;
        set_role(&store, &id.to_hex(), Some("superhero"), false)
            .await
            .unwrap();
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().role, "superhero");
    }

    #[tokio::test]
    async fn test_set_role_canonical_only() {
        let (store, id) = store_with("a@x.com", "user").await;
        let err = set_role(&store, &id.to_hex(), Some("superhero"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        set_role(&store, &id.to_hex(), Some("admin"), true).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_role_errors() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            set_role(&store, "not-an-id", Some("admin"), false).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            set_role(&store, &ObjectId::new().to_hex(), None, false).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            set_role(&store, &ObjectId::new().to_hex(), Some("admin"), false).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = MemoryUserStore::new();
        let input = NewUser {
            email: Some("a@x.com".into()),
            name: Some("A".into()),
            ..Default::default()
        };

        let first = register_or_fetch(&store, input.clone(), Role::User).await.unwrap();
        assert!(matches!(first, Registration::Created { ref user, .. } if user.role == "user"));

        let second = register_or_fetch(&store, input, Role::User).await.unwrap();
        assert!(matches!(second, Registration::Existing(ref user) if user.name == "A"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_requires_email() {
        let store = MemoryUserStore::new();
        let err = register_or_fetch(&store, NewUser::default(), Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_register_honours_donator_but_never_admin() {
        let store = MemoryUserStore::new();
        let register = |email: &str, role: &str| NewUser {
            email: Some(email.into()),
            role: Some(role.into()),
            ..Default::default()
        };

        register_or_fetch(&store, register("d@x.com", "donator"), Role::User)
            .await
            .unwrap();
        register_or_fetch(&store, register("a@x.com", "admin"), Role::User)
            .await
            .unwrap();
        register_or_fetch(&store, register("o@x.com", "superhero"), Role::User)
            .await
            .unwrap();

        for (email, role) in [("d@x.com", "donator"), ("a@x.com", "user"), ("o@x.com", "user")] {
            assert_eq!(store.find_by_email(email).await.unwrap().unwrap().role, role);
        }
    }
}
