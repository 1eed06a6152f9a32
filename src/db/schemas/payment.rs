//! Payment record schema
//!
//! `amount` is stored exactly as the client sent it: a number or a numeric
//! string. Aggregation coerces it when summing.

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{metadata::rfc3339, Metadata};

/// Collection name for payments
pub const PAYMENT_COLLECTION: &str = "payments";

/// Payment document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PaymentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub amount: Bson,

    #[serde(
        default,
        rename = "transactionId",
        alias = "transaction_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime>,
}

impl PaymentDoc {
    /// API representation
    pub fn view(&self) -> Value {
        json!({
            "_id": self._id.map(|id| id.to_hex()),
            "email": self.email,
            "amount": self.amount.clone().into_relaxed_extjson(),
            "transactionId": self.transaction_id,
            "timestamp": rfc3339(self.timestamp),
        })
    }
}

/// Convert a client-supplied amount into its stored form.
///
/// Numbers and strings are kept verbatim; anything else is rejected.
pub fn amount_from_json(value: &Value) -> Option<Bson> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Bson::Int64)
            .or_else(|| n.as_f64().map(Bson::Double)),
        Value::String(s) => Some(Bson::String(s.clone())),
        _ => None,
    }
}

impl IntoIndexes for PaymentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(IndexOptions::builder().name("email_index".to_string()).build()),
        )]
    }
}

impl MutMetadata for PaymentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
