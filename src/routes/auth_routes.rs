//! Session routes
//!
//! - POST /jwt    - issue a credential for an externally authenticated identity
//! - GET  /logout - clear the session cookie
//!
//! Logout is purely client side: the credential itself stays valid until it
//! expires.

use bytes::Bytes;
use hyper::header::SET_COOKIE;
use hyper::{Response, StatusCode};
use serde_json::json;
use tracing::info;

use super::response::{json_response, parse_json, success_shape, FullBody};
use crate::auth::{cleared_session_cookie, session_cookie, IdentityInput};
use crate::server::AppState;
use crate::types::{AppError, Result};

/// Handle POST /jwt
pub fn issue(state: &AppState, body: &Bytes) -> Response<FullBody> {
    issue_inner(state, body).unwrap_or_else(|e| success_shape(&e))
}

fn issue_inner(state: &AppState, body: &Bytes) -> Result<Response<FullBody>> {
    let identity: IdentityInput = parse_json(body)?;
    if identity.email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".into()));
    }

    let tokens = state.gate.tokens();
    let issued = tokens.issue(&identity)?;
    let cookie = session_cookie(&issued.token, tokens.ttl_seconds())?;

    info!("Issued session credential for {}", issued.claim.email);

    let mut response = json_response(StatusCode::OK, &json!({ "success": true }));
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

/// Handle GET /logout
pub fn logout() -> Response<FullBody> {
    let mut response = json_response(StatusCode::OK, &json!({ "success": true }));
    response
        .headers_mut()
        .append(SET_COOKIE, cleared_session_cookie());
    response
}
