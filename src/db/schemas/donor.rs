//! Donor document schema
//!
//! Donor profiles are loosely structured: the fields the service filters on
//! are typed, everything else the client sends is kept as-is in `profile`.
//! A record whose filter field holds something other than a string (older
//! clients wrote arbitrary JSON) keeps that value in `profile` instead of
//! failing to load.

use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for donors
pub const DONOR_COLLECTION: &str = "donors";

/// Fields a client may not overwrite through the API
pub const DONOR_RESERVED_FIELDS: &[&str] = &["_id", "metadata"];

/// Donor document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "Document")]
pub struct DonorDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub metadata: Metadata,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,

    #[serde(rename = "bloodGroup", skip_serializing_if = "String::is_empty")]
    pub blood_group: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,

    /// Remaining client-supplied fields (contact number, last donation, ...)
    #[serde(flatten)]
    pub profile: Document,
}

impl DonorDoc {
    /// API representation: hex `_id`, relaxed extended JSON for the profile
    pub fn view(&self) -> Value {
        let mut out = serde_json::Map::new();
        if let Some(id) = self._id {
            out.insert("_id".into(), Value::String(id.to_hex()));
        }
        for (key, value) in &self.profile {
            out.insert(key.clone(), value.clone().into_relaxed_extjson());
        }
        for (key, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("bloodGroup", &self.blood_group),
            ("location", &self.location),
        ] {
            // A non-string legacy value already sits in the profile
            if !value.is_empty() || !out.contains_key(key) {
                out.insert(key.into(), Value::String(value.clone()));
            }
        }
        Value::Object(out)
    }
}

impl From<Document> for DonorDoc {
    fn from(mut raw: Document) -> Self {
        let _id = match raw.remove("_id") {
            Some(Bson::ObjectId(id)) => Some(id),
            _ => None,
        };
        let metadata = raw
            .remove("metadata")
            .and_then(|m| bson::from_bson(m).ok())
            .unwrap_or_default();

        DonorDoc {
            _id,
            metadata,
            name: take_text(&mut raw, &["name"]),
            email: take_text(&mut raw, &["email"]),
            blood_group: take_text(&mut raw, &["bloodGroup", "blood_group"]),
            location: take_text(&mut raw, &["location"]),
            profile: raw,
        }
    }
}

/// Remove the first string value found under `keys`; other types stay put
fn take_text(raw: &mut Document, keys: &[&str]) -> String {
    for key in keys {
        if matches!(raw.get(*key), Some(Bson::String(_))) {
            if let Some(Bson::String(text)) = raw.remove(*key) {
                return text;
            }
        }
    }
    String::new()
}

/// Equality filters accepted by `GET /donors`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DonorFilter {
    #[serde(default, rename = "bloodGroup", alias = "blood_group")]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl DonorFilter {
    /// MongoDB filter document
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(bg) = non_empty(&self.blood_group) {
            filter.insert("bloodGroup", bg);
        }
        if let Some(location) = non_empty(&self.location) {
            filter.insert("location", location);
        }
        if let Some(email) = non_empty(&self.email) {
            filter.insert("email", email);
        }
        filter
    }

    /// Same predicate, evaluated in memory
    pub fn matches(&self, donor: &DonorDoc) -> bool {
        non_empty(&self.blood_group).map_or(true, |bg| donor.blood_group == bg)
            && non_empty(&self.location).map_or(true, |l| donor.location == l)
            && non_empty(&self.email).map_or(true, |e| donor.email == e)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IntoIndexes for DonorDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(IndexOptions::builder().name("email_index".to_string()).build()),
            ),
            (
                doc! { "bloodGroup": 1 },
                Some(
                    IndexOptions::builder()
                        .name("blood_group_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for DonorDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_fields_survive_in_profile() {
        let raw = doc! {
            "name": "Rahim",
            "email": "r@x.com",
            "bloodGroup": "O+",
            "location": "Dhaka",
            "contactNumber": "0171",
            "age": 29,
        };
        let donor: DonorDoc = bson::from_document(raw).unwrap();
        assert_eq!(donor.blood_group, "O+");
        assert_eq!(donor.profile.get_str("contactNumber").unwrap(), "0171");

        let view = donor.view();
        assert_eq!(view["age"], 29);
        assert_eq!(view["bloodGroup"], "O+");
    }

    #[test]
    fn test_non_string_location_is_kept_in_profile() {
        let id = ObjectId::new();
        let raw = doc! {
            "_id": id,
            "name": "X",
            "location": { "district": "Dhaka" },
        };
        let bytes = bson::to_vec(&raw).unwrap();
        let donor: DonorDoc = bson::from_slice(&bytes).unwrap();

        assert_eq!(donor._id, Some(id));
        assert_eq!(donor.name, "X");
        assert_eq!(donor.location, "");
        assert_eq!(
            donor.profile.get_document("location").unwrap(),
            &doc! { "district": "Dhaka" }
        );

        let view = donor.view();
        assert_eq!(view["location"]["district"], "Dhaka");
        assert_eq!(view["name"], "X");
        assert_eq!(view["email"], "");
    }

    #[test]
    fn test_document_round_trip_has_no_duplicate_keys() {
        let raw = doc! {
            "name": "X",
            "bloodGroup": "AB+",
            "location": { "district": "Dhaka" },
            "metadata": { "created_at": bson::DateTime::now() },
        };
        let donor: DonorDoc = bson::from_document(raw).unwrap();
        let stored = bson::to_document(&donor).unwrap();

        assert_eq!(stored.get_str("bloodGroup").unwrap(), "AB+");
        assert!(stored.get_document("location").is_ok());
        assert_eq!(stored.keys().filter(|k| *k == "location").count(), 1);

        let again: DonorDoc = bson::from_document(stored).unwrap();
        assert_eq!(again, donor);
    }

    #[test]
    fn test_filter_document_skips_blank_values() {
        let filter = DonorFilter {
            blood_group: Some("A-".into()),
            location: Some("  ".into()),
            email: None,
        };
        assert_eq!(filter.to_document(), doc! { "bloodGroup": "A-" });
    }

    #[test]
    fn test_filter_matches_in_memory() {
        let donor = DonorDoc {
            blood_group: "B+".into(),
            location: "Khulna".into(),
            ..Default::default()
        };
        assert!(DonorFilter::default().matches(&donor));
        assert!(DonorFilter {
            blood_group: Some("B+".into()),
            ..Default::default()
        }
        .matches(&donor));
        assert!(!DonorFilter {
            location: Some("Dhaka".into()),
            ..Default::default()
        }
        .matches(&donor));
    }
}
