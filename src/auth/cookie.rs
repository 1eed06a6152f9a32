//! Session cookie contract
//!
//! Cookie `token`: HttpOnly, Secure, SameSite=None, Path=/, Max-Age equal to
//! the credential lifetime. Logout clears it with Max-Age=0.

use hyper::header::{HeaderMap, HeaderValue, COOKIE};

use crate::types::AppError;

/// Name of the cookie carrying the session credential
pub const SESSION_COOKIE: &str = "token";

/// Read a cookie value from the request headers.
///
/// Multiple `Cookie` headers are allowed; the first match wins.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// The raw session credential, if the client sent one
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    read_cookie(headers, SESSION_COOKIE).filter(|token| !token.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued credential
pub fn session_cookie(token: &str, max_age_seconds: u64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=None",
        SESSION_COOKIE, token, max_age_seconds
    ))
    .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))
}

/// `Set-Cookie` value that makes the client drop the credential
pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "token=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; Secure; SameSite=None",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn test_read_session_token() {
        let h = headers(&["theme=dark; token=abc.def.ghi; lang=en"]);
        assert_eq!(session_token(&h), Some("abc.def.ghi"));
    }

    #[test]
    fn test_read_across_multiple_cookie_headers() {
        let h = headers(&["theme=dark", "token=abc"]);
        assert_eq!(session_token(&h), Some("abc"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(session_token(&headers(&[])), None);
        assert_eq!(session_token(&headers(&["token="])), None);
        assert_eq!(session_token(&headers(&["tokens=abc"])), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie("abc", 31_536_000).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("token=abc;"));
        assert!(value.contains("Max-Age=31536000"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=None"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let value = cleared_session_cookie();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("token=;"));
        assert!(value.contains("Max-Age=0"));
    }
}
