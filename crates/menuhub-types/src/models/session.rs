//! Sign-in grants and the persisted credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token block returned by sign-in and refresh (`accessToken` in the payload).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Bearer access token
    pub token: String,
    /// Access token expiry, epoch seconds
    pub expire_at: i64,
    /// Rotating refresh token
    pub refresh_token: String,
    /// Refresh token expiry, epoch seconds
    pub refresh_token_expire_at: i64,
}

/// Payload of `POST /auth/signin-password` and `POST /auth/refresh-token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Issued tokens
    pub access_token: AuthToken,
    /// Display name; only sign-in returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
}

/// The credential pair the store persists, replaced as a whole on refresh.
///
/// Expiries are the server-issued epoch timestamps, untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Bearer access token
    pub access_token: String,
    /// Access token expiry, epoch seconds
    pub access_token_expires_at: i64,
    /// Rotating refresh token
    pub refresh_token: String,
    /// Refresh token expiry, epoch seconds
    pub refresh_token_expires_at: i64,
}

impl From<AuthToken> for Credential {
    fn from(token: AuthToken) -> Self {
        Self {
            access_token: token.token,
            access_token_expires_at: token.expire_at,
            refresh_token: token.refresh_token,
            refresh_token_expires_at: token.refresh_token_expire_at,
        }
    }
}

impl Credential {
    /// Seconds until the access token expires, clamped at zero.
    pub fn access_max_age(&self, now: i64) -> i64 {
        self.access_token_expires_at.saturating_sub(now).max(0)
    }

    /// Seconds until the refresh token expires, clamped at zero.
    pub fn refresh_max_age(&self, now: i64) -> i64 {
        self.refresh_token_expires_at.saturating_sub(now).max(0)
    }

    /// Check if the access token is expired at `now`.
    pub fn is_access_expired(&self, now: i64) -> bool {
        now >= self.access_token_expires_at
    }

    /// Check if the refresh token is expired at `now`.
    pub fn is_refresh_expired(&self, now: i64) -> bool {
        now >= self.refresh_token_expires_at
    }

    /// Access token expiry as a UTC timestamp.
    pub fn access_expires_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.access_token_expires_at, 0)
    }

    /// Refresh token expiry as a UTC timestamp.
    pub fn refresh_expires_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.refresh_token_expires_at, 0)
    }
}
