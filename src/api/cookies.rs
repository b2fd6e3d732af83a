//! Cookie header helpers
//!
//! Reads a named value out of `Cookie` request headers and appends
//! `Set-Cookie` headers built from a [`CookieDescriptor`].

use crate::error::{CoreError, Result};
use crate::session::CookieDescriptor;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

/// Value of the cookie called `name`, if the request carries one.
///
/// Multiple `Cookie` headers are searched in order; the first match wins.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// Append a `Set-Cookie` header for `descriptor`.
pub fn write_cookie(headers: &mut HeaderMap, descriptor: &CookieDescriptor) -> Result<()> {
    let value = HeaderValue::from_str(&descriptor.to_header_value())
        .map_err(|e| CoreError::Api(format!("Invalid cookie header: {}", e)))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_read_cookie() {
        let map = headers(&["theme=dark; session=abc123; lang=en"]);
        assert_eq!(read_cookie(&map, "session").as_deref(), Some("abc123"));
        assert_eq!(read_cookie(&map, "lang").as_deref(), Some("en"));
        assert!(read_cookie(&map, "missing").is_none());
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let map = headers(&["a=1", "session=\"quoted\""]);
        assert_eq!(read_cookie(&map, "session").as_deref(), Some("quoted"));
    }

    #[test]
    fn test_read_cookie_requires_exact_name() {
        let map = headers(&["my_session=x; session_old=y"]);
        assert!(read_cookie(&map, "session").is_none());
        assert!(read_cookie(&HeaderMap::new(), "session").is_none());
    }

    #[test]
    fn test_write_cookie() {
        let descriptor = CookieDescriptor {
            name: "session".into(),
            value: "abc".into(),
            path: "/".into(),
            http_only: true,
            max_age_secs: 600,
            secure: false,
        };
        let mut map = HeaderMap::new();
        write_cookie(&mut map, &descriptor).unwrap();
        write_cookie(&mut map, &descriptor).unwrap();

        let values: Vec<_> = map.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "session=abc; Path=/; Max-Age=600; HttpOnly");
    }
}
