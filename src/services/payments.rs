//! Payment processor client
//!
//! Creates card payment intents and hands the client secret back to the
//! browser, which completes the payment directly with the processor.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::types::{AppError, Result};

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an intent for `amount_minor` (cents) and return its client secret
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct IntentResponse {
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct ProcessorError {
    error: ProcessorErrorBody,
}

#[derive(Deserialize)]
struct ProcessorErrorBody {
    #[serde(default)]
    message: String,
}

/// Stripe payment intents API
pub struct StripeProcessor {
    http_client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl StripeProcessor {
    pub fn new(api_url: &str, secret_key: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bloodline/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }
}

/// Form body for a card payment intent
fn intent_form(amount_minor: i64, currency: &str) -> Result<String> {
    serde_urlencoded::to_string([
        ("amount", amount_minor.to_string().as_str()),
        ("currency", currency),
        ("payment_method_types[]", "card"),
    ])
    .map_err(|e| AppError::Internal(format!("Failed to encode payment form: {}", e)))
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/payment_intents", self.api_url))
            .bearer_auth(&self.secret_key)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(intent_form(amount_minor, currency)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProcessorError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Payment processor returned {}: {}",
                status, message
            )));
        }

        let intent: IntentResponse = response.json().await?;
        let secret = intent
            .client_secret
            .ok_or_else(|| AppError::Upstream("Payment intent has no client secret".into()))?;

        info!("Created payment intent for {} {}", amount_minor, currency);
        Ok(secret)
    }
}

/// Convert a client-supplied price into minor units.
///
/// Accepts a number or a numeric string; it must be finite and positive.
pub fn price_to_minor_units(price: Option<&Value>) -> Result<i64> {
    let value = match price {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() && v > 0.0 => {
            let minor = (v * 100.0).round();
            if minor < 1.0 || minor > i64::MAX as f64 {
                Err(AppError::BadRequest("Invalid price".into()))
            } else {
                Ok(minor as i64)
            }
        }
        _ => Err(AppError::BadRequest("Invalid price".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_conversion() {
        assert_eq!(price_to_minor_units(Some(&json!(25))).unwrap(), 2500);
        assert_eq!(price_to_minor_units(Some(&json!(19.99))).unwrap(), 1999);
        assert_eq!(price_to_minor_units(Some(&json!("12.5"))).unwrap(), 1250);
    }

    #[test]
    fn test_invalid_prices() {
        for bad in [json!(0), json!(-5), json!("abc"), json!(null), json!(true), json!(0.001)] {
            assert!(
                matches!(price_to_minor_units(Some(&bad)), Err(AppError::BadRequest(_))),
                "{} should be rejected",
                bad
            );
        }
        assert!(price_to_minor_units(None).is_err());
    }

    #[test]
    fn test_intent_form_encoding() {
        let form = intent_form(1999, "usd").unwrap();
        assert_eq!(
            form,
            "amount=1999&currency=usd&payment_method_types%5B%5D=card"
        );
    }
}
