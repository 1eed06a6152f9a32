//! Review routes
//!
//! - GET    /reviews      - newest first
//! - POST   /reviews      - add a review, `message` required
//! - DELETE /reviews/:id  - remove

use bson::oid::ObjectId;
use bytes::Bytes;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::response::{json_response, parse_json, status_shape, FullBody};
use crate::db::schemas::{Metadata, ReviewDoc, ReviewView};
use crate::server::AppState;
use crate::types::{AppError, Result};

#[derive(Debug, Deserialize)]
struct NewReview {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "image", alias = "photoURL")]
    photo: Option<String>,
}

fn respond(result: Result<Response<FullBody>>) -> Response<FullBody> {
    result.unwrap_or_else(|e| status_shape(&e))
}

/// Handle GET /reviews
pub async fn list(state: &AppState) -> Response<FullBody> {
    respond(
        state
            .stores
            .reviews
            .list()
            .await
            .map(|reviews| {
                let views: Vec<ReviewView> = reviews.iter().map(ReviewDoc::view).collect();
                json_response(StatusCode::OK, &views)
            }),
    )
}

/// Handle POST /reviews
pub async fn create(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(create_inner(state, body).await)
}

async fn create_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let input: NewReview = parse_json(body)?;
    let message = input
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Review message is required".into()))?;

    if let Some(rating) = input.rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(AppError::BadRequest("Rating must be between 0 and 5".into()));
        }
    }

    let review = ReviewDoc {
        _id: None,
        metadata: Metadata::new(),
        name: input.name.unwrap_or_default(),
        email: input.email,
        rating: input.rating,
        message,
        photo: input.photo,
    };

    let id = state.stores.reviews.insert(review).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "insertedId": id.to_hex() }),
    ))
}

/// Handle DELETE /reviews/:id
pub async fn delete(state: &AppState, raw_id: &str) -> Response<FullBody> {
    respond(delete_inner(state, raw_id).await)
}

async fn delete_inner(state: &AppState, raw_id: &str) -> Result<Response<FullBody>> {
    let id = ObjectId::parse_str(raw_id)?;
    if !state.stores.reviews.delete(id).await? {
        return Err(AppError::NotFound("Review not found".into()));
    }
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "deletedCount": 1 }),
    ))
}
