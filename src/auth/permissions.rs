//! Roles and access levels
//!
//! A user's `role` is a free-form string in the store. The three canonical
//! values map onto ordered access levels; anything else grants no tier above
//! plain authentication.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical role stored on a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Role {
    /// Registered user (default on registration)
    #[default]
    User,
    /// User who opted in as a blood donor
    Donator,
    /// Platform administrator, assigned only by another admin
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Donator => "donator",
            Role::Admin => "admin",
        }
    }

    /// Exact, case-sensitive match on the canonical names
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "user" => Some(Role::User),
            "donator" => Some(Role::Donator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Self-service toggle target.
    ///
    /// Only inspects "is it currently donator": every other value, `admin`
    /// included, becomes `donator`.
    pub fn toggled(current: &str) -> Role {
        if current == Role::Donator.as_str() {
            Role::User
        } else {
            Role::Donator
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// Minimum access level an endpoint declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
#[derive(Default)]
pub enum AccessLevel {
    /// No credential needed
    #[default]
    Anonymous = 0,
    /// Valid credential, no role lookup
    Authenticated = 1,
    /// Valid credential and resolved role donator or admin
    Donator = 2,
    /// Valid credential and resolved role exactly admin
    Admin = 3,
}

impl AccessLevel {
    /// Whether this level needs the persisted role
    pub fn needs_role(&self) -> bool {
        *self >= AccessLevel::Donator
    }

    /// Level granted by a persisted role string.
    ///
    /// Non-canonical strings are accepted by the store but only grant
    /// `Authenticated`.
    pub fn granted_by(role: &str) -> AccessLevel {
        match Role::parse(role) {
            Some(Role::Admin) => AccessLevel::Admin,
            Some(Role::Donator) => AccessLevel::Donator,
            Some(Role::User) | None => AccessLevel::Authenticated,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Anonymous => write!(f, "ANONYMOUS"),
            AccessLevel::Authenticated => write!(f, "AUTHENTICATED"),
            AccessLevel::Donator => write!(f, "DONATOR"),
            AccessLevel::Admin => write!(f, "ADMIN"),
        }
    }
}
