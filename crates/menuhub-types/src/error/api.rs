//! Non-success responses carrying the server's envelope messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A response the server rejected, with the envelope's human-readable parts.
///
/// `messages` and `errors` are kept verbatim so forms can map them onto
/// their fields.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("request failed ({status}): {}", self.summary())]
#[serde(rename_all = "camelCase")]
pub struct ApiFailure {
    /// HTTP status code
    pub status: u16,
    /// Top-level message from the envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field or operation messages from the envelope
    #[serde(default)]
    pub messages: Vec<String>,
    /// Error strings from the envelope
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ApiFailure {
    /// Failure with only a status, used when the body is not an envelope.
    pub fn bare(status: u16, message: Option<String>) -> Self {
        Self { status, message, messages: Vec::new(), errors: Vec::new() }
    }

    /// One line suitable for a toast: the message, else the first
    /// `messages`/`errors` entry, else a generic text.
    pub fn summary(&self) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.messages.first().map(String::as_str))
            .or_else(|| self.errors.first().map(String::as_str))
            .unwrap_or("no message provided")
            .to_string()
    }

    /// Whether the server attached any field-level detail.
    pub fn has_details(&self) -> bool {
        !self.messages.is_empty() || !self.errors.is_empty()
    }
}
