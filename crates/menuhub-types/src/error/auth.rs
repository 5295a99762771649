//! Authentication failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The session can no longer be used and the user has to sign in again.
///
/// Produced by a rejected login, a missing or rejected refresh token, or a
/// request that is still unauthorized after its replay.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct AuthFailure {
    /// HTTP status that caused the failure, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Server-provided or locally generated explanation
    pub message: String,
}

impl AuthFailure {
    /// The server answered with a non-success status.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    /// No refresh token is stored, so the session cannot be renewed.
    pub fn missing_refresh_token() -> Self {
        Self { status: None, message: "no refresh token stored".to_string() }
    }

    /// The request was replayed with a fresh token and still got a 401.
    pub fn unauthorized_after_replay() -> Self {
        Self {
            status: Some(401),
            message: "request unauthorized after token refresh".to_string(),
        }
    }

    /// The refresh could not complete (transport error, bad payload, task died).
    pub fn refresh_failed(reason: impl std::fmt::Display) -> Self {
        Self { status: None, message: format!("token refresh failed: {reason}") }
    }
}
