//! Business (tenant) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business as listed in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    /// Tenant key sent as `x-slug` on panel requests
    pub slug: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub logo_wordmark_url: Option<String>,
    #[serde(default)]
    pub vat_percentage: f64,
    /// Server-defined rounding mode (0, 1 or 2)
    #[serde(default)]
    pub rounding_strategy: u8,
    /// Creation time, epoch seconds
    #[serde(default)]
    pub created_on: i64,
}

impl Business {
    pub fn created_on_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_on, 0)
    }
}

/// Body of `POST /workspace/businesses`.
///
/// `logoId`, `locationId` and `seoId` are sent as explicit `null` when unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessPayload {
    pub name: String,
    pub slug: String,
    pub logo_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_typography_id: Option<String>,
    pub vat_percentage: f64,
    pub rounding_strategy: u8,
    pub location_id: Option<String>,
    pub seo_id: Option<String>,
}

impl CreateBusinessPayload {
    /// Payload with no logo, location or SEO block.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, vat_percentage: f64) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            logo_id: None,
            logo_typography_id: None,
            vat_percentage,
            rounding_strategy: 0,
            location_id: None,
            seo_id: None,
        }
    }
}
