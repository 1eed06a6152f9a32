//! Payment routes
//!
//! - GET  /paymentInfo?email=     - payment records, optionally for one email
//! - POST /savePaymentInfo        - record a completed payment
//! - POST /create-payment-intent  - card payment intent, returns `clientSecret`

use bson::DateTime;
use bytes::Bytes;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::response::{json_response, parse_json, parse_query, status_shape, FullBody};
use crate::db::schemas::{amount_from_json, Metadata, PaymentDoc};
use crate::server::AppState;
use crate::services::price_to_minor_units;
use crate::types::{AppError, Result};

#[derive(Debug, Default, Deserialize)]
struct PaymentQuery {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewPayment {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default, rename = "transactionId", alias = "transaction_id")]
    transaction_id: Option<String>,
    #[serde(default, alias = "date")]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IntentRequest {
    #[serde(default)]
    price: Option<Value>,
}

fn respond(result: Result<Response<FullBody>>) -> Response<FullBody> {
    result.unwrap_or_else(|e| status_shape(&e))
}

/// Handle GET /paymentInfo
pub async fn list(state: &AppState, query: Option<&str>) -> Response<FullBody> {
    respond(list_inner(state, query).await)
}

async fn list_inner(state: &AppState, query: Option<&str>) -> Result<Response<FullBody>> {
    let query: PaymentQuery = parse_query(query)?;
    let email = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let payments: Vec<Value> = state
        .stores
        .payments
        .list(email)
        .await?
        .iter()
        .map(PaymentDoc::view)
        .collect();
    Ok(json_response(StatusCode::OK, &payments))
}

/// Handle POST /savePaymentInfo
pub async fn save(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(save_inner(state, body).await)
}

async fn save_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let input: NewPayment = parse_json(body)?;

    let email = input
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".into()))?;
    let amount = input
        .amount
        .as_ref()
        .and_then(amount_from_json)
        .ok_or_else(|| AppError::BadRequest("Amount must be a number or numeric string".into()))?;

    let timestamp = match input.timestamp.as_deref() {
        Some(raw) => DateTime::parse_rfc3339_str(raw)
            .map_err(|_| AppError::BadRequest("Invalid timestamp".into()))?,
        None => DateTime::now(),
    };

    let payment = PaymentDoc {
        _id: None,
        metadata: Metadata::new(),
        email,
        amount,
        transaction_id: input.transaction_id,
        timestamp: Some(timestamp),
    };

    let id = state.stores.payments.insert(payment).await?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "acknowledged": true, "insertedId": id.to_hex() }),
    ))
}

/// Handle POST /create-payment-intent
pub async fn create_intent(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(create_intent_inner(state, body).await)
}

async fn create_intent_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let input: IntentRequest = parse_json(body)?;
    let amount = price_to_minor_units(input.price.as_ref())?;

    let processor = state
        .payments
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Payment processing is not configured".into()))?;

    let currency = &state.args.payment.payment_currency;
    let client_secret = processor.create_intent(amount, currency).await?;

    info!("Payment intent created for {} minor units", amount);
    Ok(json_response(
        StatusCode::OK,
        &json!({ "clientSecret": client_secret }),
    ))
}
