//! # Link Session Cookie
//!
//! The persistent Link session token travels between requests in a single
//! named cookie. One route sets it (after redirect-based completion), one
//! route reads it (intent creation); nothing else touches it.

use chrono::{DateTime, Duration, Utc};

/// Name of the cookie carrying the Link persistent session token
pub const LINK_PERSISTENT_TOKEN_COOKIE: &str = "stripe.link.persistent_token";

/// Cookie lifetime: 90 days
pub const SESSION_COOKIE_TTL_DAYS: i64 = 90;

/// A session cookie ready to be attached to a response.
///
/// Attributes are fixed: `Secure; HttpOnly; SameSite=Strict; Path=/` with a
/// 90-day expiry. The value is the opaque token returned by the processor,
/// never synthesized or validated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    value: String,
    expires: DateTime<Utc>,
}

impl SessionCookie {
    /// Create a cookie expiring 90 days from now
    pub fn new(value: impl Into<String>) -> Self {
        Self::expiring_at(value, Utc::now() + Duration::days(SESSION_COOKIE_TTL_DAYS))
    }

    /// Create a cookie with an explicit expiry (for tests)
    pub fn expiring_at(value: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Render the `Set-Cookie` header value.
    ///
    /// The `Expires` date uses the IMF-fixdate format required by RFC 7231.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Expires={}; Path=/; Secure; HttpOnly; SameSite=Strict",
            LINK_PERSISTENT_TOKEN_COOKIE,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        )
    }
}

/// Extract a named cookie value from an inbound `Cookie` header.
///
/// Cookie headers are `name=value` pairs separated by `; `. Returns the
/// first match; a missing or malformed pair is simply no cookie.
pub fn cookie_from_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k.trim() == name {
            Some(v.trim())
        } else {
            None
        }
    })
}
