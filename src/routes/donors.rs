//! Donor directory routes
//!
//! - GET    /donors      - list, optional `bloodGroup`, `location`, `email` filters
//! - GET    /donors/:id  - one donor
//! - POST   /donors      - create
//! - PUT    /donors/:id  - set the supplied fields
//! - DELETE /donors/:id  - remove
//!
//! Errors use the status shape.

use bson::{oid::ObjectId, Document};
use bytes::Bytes;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

use super::response::{json_response, parse_json, parse_query, status_shape, FullBody};
use crate::db::schemas::{DonorDoc, DonorFilter, DONOR_RESERVED_FIELDS};
use crate::server::AppState;
use crate::types::{AppError, Result};

/// Fields stored as strings on every donor
const TEXT_FIELDS: &[&str] = &["name", "email", "bloodGroup", "location"];

fn respond(result: Result<Response<FullBody>>) -> Response<FullBody> {
    result.unwrap_or_else(|e| status_shape(&e))
}

/// Validate a client-supplied donor object and convert it to BSON
fn donor_fields(value: Value) -> Result<Document> {
    let Value::Object(mut map) = value else {
        return Err(AppError::BadRequest("Donor must be a JSON object".into()));
    };

    for reserved in DONOR_RESERVED_FIELDS {
        map.remove(*reserved);
    }
    if let Some(bg) = map.remove("blood_group") {
        map.entry("bloodGroup").or_insert(bg);
    }

    for field in TEXT_FIELDS {
        if let Some(v) = map.get(*field) {
            if !v.is_string() {
                return Err(AppError::BadRequest(format!("{} must be a string", field)));
            }
        }
    }

    bson::to_document(&map).map_err(|e| AppError::BadRequest(format!("Invalid donor: {}", e)))
}

/// Handle GET /donors
pub async fn list(state: &AppState, query: Option<&str>) -> Response<FullBody> {
    respond(list_inner(state, query).await)
}

async fn list_inner(state: &AppState, query: Option<&str>) -> Result<Response<FullBody>> {
    let filter: DonorFilter = parse_query(query)?;
    let donors: Vec<Value> = state
        .stores
        .donors
        .list(&filter)
        .await?
        .iter()
        .map(DonorDoc::view)
        .collect();
    Ok(json_response(StatusCode::OK, &donors))
}

/// Handle GET /donors/:id
pub async fn get(state: &AppState, raw_id: &str) -> Response<FullBody> {
    respond(get_inner(state, raw_id).await)
}

async fn get_inner(state: &AppState, raw_id: &str) -> Result<Response<FullBody>> {
    let id = ObjectId::parse_str(raw_id)?;
    let donor = state
        .stores
        .donors
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Donor not found".into()))?;
    Ok(json_response(StatusCode::OK, &donor.view()))
}

/// Handle POST /donors
pub async fn create(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(create_inner(state, body).await)
}

async fn create_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let fields = donor_fields(parse_json(body)?)?;
    let donor: DonorDoc = bson::from_document(fields)
        .map_err(|e| AppError::BadRequest(format!("Invalid donor: {}", e)))?;
    let id = state.stores.donors.insert(donor).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "insertedId": id.to_hex() }),
    ))
}

/// Handle PUT /donors/:id
pub async fn update(state: &AppState, raw_id: &str, body: &Bytes) -> Response<FullBody> {
    respond(update_inner(state, raw_id, body).await)
}

async fn update_inner(state: &AppState, raw_id: &str, body: &Bytes) -> Result<Response<FullBody>> {
    let id = ObjectId::parse_str(raw_id)?;
    let fields = donor_fields(parse_json(body)?)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    if !state.stores.donors.update(id, fields).await? {
        return Err(AppError::NotFound("Donor not found".into()));
    }
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "matchedCount": 1 }),
    ))
}

/// Handle DELETE /donors/:id
pub async fn delete(state: &AppState, raw_id: &str) -> Response<FullBody> {
    respond(delete_inner(state, raw_id).await)
}

async fn delete_inner(state: &AppState, raw_id: &str) -> Result<Response<FullBody>> {
    let id = ObjectId::parse_str(raw_id)?;
    if !state.stores.donors.delete(id).await? {
        return Err(AppError::NotFound("Donor not found".into()));
    }
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "deletedCount": 1 }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donor_fields_strip_reserved_keys() {
        let fields = donor_fields(json!({
            "_id": "ffffffffffffffffffffffff",
            "metadata": {},
            "name": "R",
            "blood_group": "O+",
            "age": 30,
        }))
        .unwrap();
        assert!(!fields.contains_key("_id"));
        assert!(!fields.contains_key("metadata"));
        assert_eq!(fields.get_str("bloodGroup").unwrap(), "O+");
        assert!(fields.contains_key("age"));
    }

    #[test]
    fn test_donor_fields_type_checks() {
        assert!(donor_fields(json!(["not", "an", "object"])).is_err());
        assert!(donor_fields(json!({ "bloodGroup": 7 })).is_err());
    }
}
