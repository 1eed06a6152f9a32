//! Credentialed CORS
//!
//! The session cookie only reaches the API from browsers if the exact origin
//! is echoed back together with `Access-Control-Allow-Credentials`.

use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

use super::response::{empty_response, FullBody};

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const DEFAULT_ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// The request origin, if it is on the allow list
pub fn allowed_origin<'a>(headers: &'a HeaderMap, allowed: &[String]) -> Option<&'a HeaderValue> {
    let origin = headers.get(header::ORIGIN)?;
    let origin_str = origin.to_str().ok()?.trim_end_matches('/');
    allowed
        .iter()
        .any(|candidate| candidate == origin_str)
        .then_some(origin)
}

/// Add CORS headers for an allowed origin
pub fn decorate(mut response: Response<FullBody>, origin: Option<&HeaderValue>) -> Response<FullBody> {
    let headers = response.headers_mut();
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    response
}

/// Answer to an `OPTIONS` preflight
pub fn preflight(request_headers: &HeaderMap, origin: Option<&HeaderValue>) -> Response<FullBody> {
    let mut response = empty_response(StatusCode::NO_CONTENT);
    if origin.is_some() {
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            request_headers
                .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOWED_HEADERS)),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    }
    decorate(response, origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_origin(origin: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static(origin));
        headers
    }

    #[test]
    fn test_only_listed_origins_are_echoed() {
        let allowed = vec!["http://localhost:5173".to_string()];
        assert!(allowed_origin(&with_origin("http://localhost:5173"), &allowed).is_some());
        assert!(allowed_origin(&with_origin("https://evil.example"), &allowed).is_none());
        assert!(allowed_origin(&HeaderMap::new(), &allowed).is_none());
    }

    #[test]
    fn test_preflight_headers() {
        let headers = with_origin("http://localhost:5173");
        let response = preflight(&headers, headers.get(header::ORIGIN));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let h = response.headers();
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(h.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[test]
    fn test_unlisted_origin_gets_no_allow_headers() {
        let response = decorate(empty_response(StatusCode::OK), None);
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
