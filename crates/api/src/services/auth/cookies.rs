//! The `auth-token` session cookie.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use super::token::TOKEN_TTL_SECS;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth-token";

/// Cookie carrying a freshly issued token.
///
/// `secure` is set when the public base URL is served over HTTPS.
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(TOKEN_TTL_SECS))
        .build()
}

/// Cookie that makes the browser drop the session.
#[must_use]
pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// The session token from the request's `Cookie` headers, if any.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let header = session_cookie("abc.def.ghi".to_string(), true).to_string();
        assert!(header.starts_with("auth-token=abc.def.ghi"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
    }

    #[test]
    fn test_insecure_cookie_for_plain_http() {
        let header = session_cookie("t".to_string(), false).to_string();
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let header = cleared_cookie(false).to_string();
        assert!(header.starts_with("auth-token=;"));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; auth-token=tok123"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("tok123"));

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("auth-token=second"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("second"));

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("auth-token="));
        assert_eq!(token_from_headers(&headers), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
