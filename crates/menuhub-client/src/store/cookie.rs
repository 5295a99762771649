//! Session cookies as the browser would hold them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        };
        f.write_str(s)
    }
}

/// A cookie scoped to `/` that expires at a server-issued epoch timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    #[serde(default)]
    pub same_site: SameSite,
    /// Epoch seconds
    pub expires_at: i64,
}

impl SessionCookie {
    pub fn new(name: &str, value: &str, expires_at: i64) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            same_site: SameSite::Lax,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// `max-age` relative to `now`, clamped at zero.
    pub fn max_age(&self, now: i64) -> i64 {
        self.expires_at.saturating_sub(now).max(0)
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(expires) = DateTime::from_timestamp(self.expires_at, 0) {
            out.push_str(&format!("; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
        }
        out.push_str(&format!("; SameSite={}", self.same_site));
        out
    }
}

/// Split a `Cookie` request header into name/value pairs. Later duplicates
/// win; malformed pairs are skipped.
pub fn parse_cookie_header(header: &str) -> BTreeMap<&str, &str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_rendering() {
        let cookie = SessionCookie::new("sessionId", "T1", 1_700_000_000);
        assert_eq!(
            cookie.to_set_cookie(),
            "sessionId=T1; Path=/; Expires=Tue, 14 Nov 2023 22:13:20 GMT; SameSite=Lax"
        );
    }

    #[test]
    fn test_max_age_and_expiry() {
        let cookie = SessionCookie::new("refreshToken", "R1", 100);
        assert_eq!(cookie.max_age(40), 60);
        assert_eq!(cookie.max_age(400), 0);
        assert!(!cookie.is_expired(99));
        assert!(cookie.is_expired(100));
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sessionId=T1; theme=dark;broken; refreshToken=R1");
        assert_eq!(cookies.get("sessionId"), Some(&"T1"));
        assert_eq!(cookies.get("refreshToken"), Some(&"R1"));
        assert_eq!(cookies.get("broken"), None);
        assert_eq!(cookies.len(), 3);
    }
}
