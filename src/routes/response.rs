//! Response builders shared by all routes
//!
//! Two error body shapes exist side by side:
//! - status shape `{"status":"error","message":..,"method"?:..}` for the
//!   directory, payment and mail routes and for unmatched paths
//! - success shape `{"success":false,"message":..}` for session, user,
//!   role and admin routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::error;

use crate::auth::Denial;
use crate::types::{AppError, Result};

pub type FullBody = Full<Bytes>;

fn fallback(status: StatusCode, body: &'static str) -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Serialize `body` as JSON with the given status
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<FullBody> {
    match serde_json::to_vec(body) {
        Ok(json) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .unwrap_or_else(|_| {
                fallback(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
            }),
        Err(_) => fallback(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to serialize response",
        ),
    }
}

/// Plain text body
pub fn text_response(status: StatusCode, body: &'static str) -> Response<FullBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|_| fallback(status, body))
}

/// Empty body, used for preflight answers
pub fn empty_response(status: StatusCode) -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// `{"status":"error", ...}` body
pub fn status_error(
    status: StatusCode,
    message: &str,
    method: Option<&Method>,
) -> Response<FullBody> {
    let body = match method {
        Some(method) => json!({ "status": "error", "message": message, "method": method.as_str() }),
        None => json!({ "status": "error", "message": message }),
    };
    json_response(status, &body)
}

/// `{"success":false, ...}` body
pub fn success_error(status: StatusCode, message: &str) -> Response<FullBody> {
    json_response(status, &json!({ "success": false, "message": message }))
}

fn log_if_server_error(err: &AppError) {
    if err.is_server_error() {
        error!("Request failed: {}", err);
    }
}

/// Status-shape rendering of a handler error
pub fn status_shape(err: &AppError) -> Response<FullBody> {
    log_if_server_error(err);
    status_error(err.status_code(), &err.public_message(), None)
}

/// Success-shape rendering of a handler error
pub fn success_shape(err: &AppError) -> Response<FullBody> {
    log_if_server_error(err);
    success_error(err.status_code(), &err.public_message())
}

/// Gate rejection, always in the success shape
pub fn denial_response(denial: &Denial) -> Response<FullBody> {
    success_error(denial.status_code(), denial.message())
}

/// Unmatched method/path pair
pub fn not_found(method: &Method, path: &str) -> Response<FullBody> {
    status_error(
        StatusCode::NOT_FOUND,
        &format!("Route not found: {}", path),
        Some(method),
    )
}

/// Parse a JSON request body
pub fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Request body is required".into()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// Parse the query string into `T`; a missing query parses as empty
pub fn parse_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e)))
}

/// Percent-decode a single path segment
pub fn decode_segment(segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|_| AppError::BadRequest("Invalid path encoding".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde::Deserialize;

    async fn body_json(response: Response<FullBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let response = not_found(&Method::DELETE, "/nowhere");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Route not found: /nowhere");
        assert_eq!(body["method"], "DELETE");
    }

    #[tokio::test]
    async fn test_server_errors_render_generic_message() {
        let response = success_shape(&AppError::Database("socket closed".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_status_shape_has_no_method() {
        let body = body_json(status_shape(&AppError::BadRequest("Invalid price".into()))).await;
        assert_eq!(body, json!({ "status": "error", "message": "Invalid price" }));
    }

    #[test]
    fn test_parse_json_rejects_empty_and_malformed() {
        #[derive(Deserialize)]
        struct Probe {
            #[allow(dead_code)]
            email: String,
        }
        assert!(parse_json::<Probe>(&Bytes::new()).is_err());
        assert!(parse_json::<Probe>(&Bytes::from_static(b"{nope")).is_err());
        assert!(parse_json::<Probe>(&Bytes::from_static(br#"{"email":"a@x.com"}"#)).is_ok());
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("a%40x.com").unwrap(), "a@x.com");
        assert_eq!(decode_segment("a+b@x.com").unwrap(), "a+b@x.com");
    }
}
