//! The uniform response envelope and paginated listings.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiFailure;

/// `{ data, isSuccess, message?, messages?, errors? }` wrapper used by every
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Payload; may be `null` on failures, so error paths parse with
    /// `serde_json::Value`
    pub data: T,
    /// Server-side success flag; a missing flag on a 2xx counts as success
    #[serde(default = "default_success")]
    pub is_success: bool,
    /// Top-level message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation messages
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    /// Error strings
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn default_success() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in a successful envelope.
    pub fn success(data: T) -> Self {
        Self { data, is_success: true, message: None, messages: Vec::new(), errors: Vec::new() }
    }

    /// Unwrap the payload, turning `isSuccess == false` into an [`ApiFailure`]
    /// that carries `status`.
    pub fn into_data(self, status: u16) -> Result<T, ApiFailure> {
        if self.is_success {
            return Ok(self.data);
        }
        Err(ApiFailure {
            status,
            message: self.message,
            messages: self.messages,
            errors: self.errors,
        })
    }

    /// Map the payload while keeping the envelope metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            is_success: self.is_success,
            message: self.message,
            messages: self.messages,
            errors: self.errors,
        }
    }
}

/// One page of a listing.
///
/// The workspace endpoints use `page`/`hasNext`/`hasPrevious`, older ones
/// `currentPage`/`hasNextPage`/`hasPreviousPage`; both parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// 1-based page number
    #[serde(default, alias = "currentPage")]
    pub page: u32,
    /// Requested page size
    #[serde(default)]
    pub page_size: u32,
    /// Items across all pages
    #[serde(default)]
    pub total_count: u64,
    /// Number of pages
    #[serde(default)]
    pub total_pages: u32,
    /// A previous page exists
    #[serde(default, alias = "hasPreviousPage")]
    pub has_previous: bool,
    /// A next page exists
    #[serde(default, alias = "hasNextPage")]
    pub has_next: bool,
}
