//! Cookie utilities
//!
//! Kratos hands its session back to the browser through `Set-Cookie`.
//! The raw header is normalized into [`CookieHeader`] at the client
//! boundary, and everything downstream works with a single
//! [`SessionCookie`].

use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use thiserror::Error;

/// Raw `Set-Cookie` header as received from the identity provider.
///
/// `Single` holds a value the producer already isolated to the named
/// cookie. `List` holds every `Set-Cookie` entry in the order received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieHeader {
    Single(String),
    List(Vec<String>),
}

impl CookieHeader {
    /// Collect all `Set-Cookie` values from a response, preserving order.
    ///
    /// Returns `None` when the response set no cookies. Values that are
    /// not valid UTF-8 are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let values: Vec<String> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| match value.to_str() {
                Ok(v) => Some(v.to_string()),
                Err(_) => {
                    tracing::warn!("Skipping non UTF-8 Set-Cookie value");
                    None
                }
            })
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(CookieHeader::List(values))
        }
    }

    /// All raw entries, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            CookieHeader::Single(value) => vec![value.as_str()],
            CookieHeader::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Build a request `Cookie` header from the `name=value` pair of each entry.
    pub fn request_cookie(&self) -> Option<String> {
        let pairs: Vec<&str> = self
            .values()
            .into_iter()
            .map(cookie_pair)
            .filter(|pair| !pair.is_empty())
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Session token extracted from a `Set-Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, attributes included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `name=value` pair without attributes, suitable for a `Cookie` header.
    pub fn pair(&self) -> &str {
        cookie_pair(&self.0)
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionCookie").field(&"[REDACTED]").finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cookie {0} not found in Set-Cookie header")]
pub struct CookieNotFound(pub String);

/// Pick the named cookie out of a `Set-Cookie` header.
///
/// A `Single` header is passed through unchanged. For a `List`, the
/// first entry starting with `"<name>="` wins.
pub fn extract_named_cookie(
    header: &CookieHeader,
    name: &str,
) -> Result<SessionCookie, CookieNotFound> {
    match header {
        CookieHeader::Single(value) => Ok(SessionCookie::new(value.clone())),
        CookieHeader::List(values) => {
            let prefix = format!("{}=", name);
            values
                .iter()
                .find(|value| value.starts_with(&prefix))
                .map(|value| SessionCookie::new(value.clone()))
                .ok_or_else(|| CookieNotFound(name.to_string()))
        }
    }
}

/// Copy every `Set-Cookie` entry onto an outgoing response.
///
/// Returns the number of entries forwarded.
pub fn forward_cookie(source: Option<&CookieHeader>, target: &mut HeaderMap) -> usize {
    let Some(source) = source else {
        return 0;
    };

    let mut forwarded = 0;
    for value in source.values() {
        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                target.append(SET_COOKIE, header_value);
                forwarded += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping Set-Cookie value that is not a valid header");
            }
        }
    }
    forwarded
}

fn cookie_pair(raw: &str) -> &str {
    raw.split(';').next().unwrap_or_default().trim()
}
