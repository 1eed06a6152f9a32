//! User document schema
//!
//! One record per email. `role` is an unconstrained string: the canonical
//! values are user, donator and admin, but whatever was last written is kept.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{metadata::rfc3339, Metadata};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Unique, the join key for session credentials
    pub email: String,

    #[serde(default)]
    pub name: String,

    #[serde(
        default,
        rename = "contactNumber",
        alias = "contact_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_number: Option<String>,

    #[serde(default, rename = "photoURL", alias = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    Role::User.as_str().to_string()
}

impl UserDoc {
    /// Create a new user document with the default role
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email: email.into(),
            name: name.into(),
            contact_number: None,
            photo_url: None,
            role: default_role(),
        }
    }

    /// API representation
    pub fn view(&self) -> UserView {
        UserView {
            id: self._id.map(|id| id.to_hex()),
            email: self.email.clone(),
            name: self.name.clone(),
            contact_number: self.contact_number.clone(),
            photo_url: self.photo_url.clone(),
            role: self.role.clone(),
            created_at: rfc3339(self.metadata.created_at),
        }
    }
}

/// User as returned over HTTP
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserView {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(rename = "contactNumber", skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_user_role() {
        let user = UserDoc::new("a@x.com", "A");
        assert_eq!(user.role, "user");
        assert!(user.metadata.created_at.is_some());
    }

    #[test]
    fn test_legacy_record_without_role_or_metadata() {
        let raw = doc! { "email": "a@x.com", "name": "A", "contactNumber": "017" };
        let user: UserDoc = bson::from_document(raw).unwrap();
        assert_eq!(user.role, "user");
        assert_eq!(user.contact_number.as_deref(), Some("017"));
        assert_eq!(user.metadata, Metadata::default());
    }

    #[test]
    fn test_view_renders_hex_id() {
        let mut user = UserDoc::new("a@x.com", "A");
        let id = ObjectId::new();
        user._id = Some(id);
        let json = serde_json::to_value(user.view()).unwrap();
        assert_eq!(json["_id"], id.to_hex());
        assert_eq!(json["role"], "user");
        assert!(json.get("contactNumber").is_none());
    }
}
