//! Outgoing mail routes
//!
//! - POST /sendReq        - ask a donor for blood on behalf of a requester
//! - POST /contactDetails - contact form, delivered to the configured inbox

use bytes::Bytes;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::response::{json_response, parse_json, status_shape, FullBody};
use crate::server::AppState;
use crate::services::OutgoingMail;
use crate::types::{AppError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DonationRequest {
    #[serde(default)]
    donor_email: Option<String>,
    #[serde(default)]
    donor_name: Option<String>,
    #[serde(default)]
    requester_name: Option<String>,
    #[serde(default)]
    requester_email: Option<String>,
    #[serde(default)]
    requester_phone: Option<String>,
    #[serde(default)]
    blood_group: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContactMessage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}

fn respond(result: Result<Response<FullBody>>) -> Response<FullBody> {
    result.unwrap_or_else(|e| status_shape(&e))
}

fn sent() -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &json!({ "status": "success", "message": "Email sent" }),
    )
}

/// Plain-text body of a donation request mail
fn donation_request_text(req: &DonationRequest, requester_name: &str, requester_email: &str) -> String {
    let mut lines = vec![format!(
        "Hello {},",
        req.donor_name.as_deref().unwrap_or("donor")
    )];
    lines.push(String::new());
    lines.push(format!(
        "{} ({}) is looking for a blood donor and found your profile.",
        requester_name, requester_email
    ));
    if let Some(bg) = &req.blood_group {
        lines.push(format!("Blood group needed: {}", bg));
    }
    if let Some(location) = &req.location {
        lines.push(format!("Location: {}", location));
    }
    if let Some(phone) = &req.requester_phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(message) = &req.message {
        lines.push(String::new());
        lines.push(message.clone());
    }
    lines.join("\n")
}

/// Handle POST /sendReq
pub async fn send_request(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(send_request_inner(state, body).await)
}

async fn send_request_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let req: DonationRequest = parse_json(body)?;
    let donor_email = required(req.donor_email.clone(), "donorEmail")?;
    let requester_name = required(req.requester_name.clone(), "requesterName")?;
    let requester_email = required(req.requester_email.clone(), "requesterEmail")?;

    let mail = OutgoingMail {
        to: donor_email,
        subject: "Blood donation request".to_string(),
        text: donation_request_text(&req, &requester_name, &requester_email),
        reply_to: Some(requester_email),
    };

    state.mailer.send(mail).await?;
    Ok(sent())
}

/// Handle POST /contactDetails
pub async fn contact(state: &AppState, body: &Bytes) -> Response<FullBody> {
    respond(contact_inner(state, body).await)
}

async fn contact_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let msg: ContactMessage = parse_json(body)?;
    let name = required(msg.name, "name")?;
    let email = required(msg.email, "email")?;
    let message = required(msg.message, "message")?;

    let mail = OutgoingMail {
        to: state.args.mail.contact_inbox.clone(),
        subject: format!("Contact form message from {}", name),
        text: format!("From: {} <{}>\n\n{}", name, email, message),
        reply_to: Some(email),
    };

    state.mailer.send(mail).await?;
    Ok(sent())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_request_text() {
        let req: DonationRequest = serde_json::from_value(json!({
            "donorEmail": "d@x.com",
            "donorName": "Karim",
            "requesterName": "Sara",
            "requesterEmail": "s@x.com",
            "bloodGroup": "A+",
        }))
        .unwrap();
        let text = donation_request_text(&req, "Sara", "s@x.com");
        assert!(text.starts_with("Hello Karim,"));
        assert!(text.contains("Sara (s@x.com)"));
        assert!(text.contains("Blood group needed: A+"));
        assert!(!text.contains("Location"));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(Some(" a ".into()), "x").unwrap(), "a");
        assert!(required(Some("  ".into()), "x").is_err());
        assert!(required(None, "x").is_err());
    }
}
