//! Common metadata for all documents
//!
//! Tracks creation and update timestamps. Records written by older clients
//! carry no metadata at all, so every field is optional.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// When the document was last updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        Self {
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }

    /// Bump the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
    }
}

/// RFC 3339 rendering of a stored timestamp for API responses
pub fn rfc3339(value: Option<DateTime>) -> Option<String> {
    value.and_then(|dt| dt.try_to_rfc3339_string().ok())
}
