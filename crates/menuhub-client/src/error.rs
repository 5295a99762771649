//! Error types for the Menuhub client.

use menuhub_types::{ApiFailure, ApiResponse, AuthFailure};
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by [`MenuClient`](crate::MenuClient).
///
/// The only failure the client recovers from on its own is a single 401 that
/// a token refresh fixes; everything else lands here.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Session is unusable: bad credentials at login, refresh failed, no
    /// refresh token, or still unauthorized after the replay.
    #[error("Authentication failed: {0}")]
    Authentication(AuthFailure),

    /// 4xx response (other than the handled 401) with the envelope's
    /// field-level messages.
    #[error("Validation failed: {0}")]
    Validation(ApiFailure),

    /// 5xx response.
    #[error("Server error: {0}")]
    Server(ApiFailure),

    /// 2xx response whose envelope reports `isSuccess: false`.
    #[error("Request rejected: {0}")]
    Rejected(ApiFailure),

    /// The server could not be reached (timeout, DNS, connection reset).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not the JSON shape the call expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading or writing the credential store failed.
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Bad configuration or arguments (base URL, empty slug, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's cancellation token fired before the request finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication(failure) => failure.status,
            Self::Validation(failure) | Self::Server(failure) | Self::Rejected(failure) => {
                Some(failure.status)
            },
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the session was cleared and the user has to sign in again.
    pub const fn is_auth_terminal(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// The envelope failure, for callers that render `messages`/`errors`.
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Validation(failure) | Self::Server(failure) | Self::Rejected(failure) => {
                Some(failure)
            },
            _ => None,
        }
    }
}

impl From<AuthFailure> for ClientError {
    fn from(failure: AuthFailure) -> Self {
        Self::Authentication(failure)
    }
}

/// Unwrap an envelope from a 2xx response, treating `isSuccess: false` as
/// [`ClientError::Rejected`].
pub trait ResponseExt<T> {
    fn into_result(self) -> Result<T, ClientError>;
}

impl<T> ResponseExt<T> for ApiResponse<T> {
    fn into_result(self) -> Result<T, ClientError> {
        self.into_data(200).map_err(ClientError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_terminal_flags() {
        let auth = ClientError::from(AuthFailure::rejected(401, "revoked"));
        assert!(auth.is_auth_terminal());
        assert_eq!(auth.status(), Some(401));

        let validation = ClientError::Validation(ApiFailure {
            status: 422,
            message: None,
            messages: vec!["Title is required".to_string()],
            errors: vec![],
        });
        assert!(!validation.is_auth_terminal());
        assert_eq!(validation.status(), Some(422));
        assert_eq!(
            validation.api_failure().map(|f| f.messages.len()),
            Some(1)
        );

        assert_eq!(ClientError::Cancelled.status(), None);
    }

    #[test]
    fn test_unsuccessful_envelope_becomes_rejected() {
        let envelope = ApiResponse {
            data: (),
            is_success: false,
            message: Some("Slug already taken".to_string()),
            messages: vec![],
            errors: vec![],
        };

        match envelope.into_result() {
            Err(ClientError::Rejected(failure)) => assert_eq!(failure.summary(), "Slug already taken"),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(ApiResponse::success(3).into_result().is_ok());
    }
}
