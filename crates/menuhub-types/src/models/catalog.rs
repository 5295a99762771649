//! Categories, products and uploaded files managed from the panel.

use serde::{Deserialize, Serialize};

/// A menu category as returned by `/panel/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "order")]
    pub display_order: Option<i32>,
}

/// Body of `POST /panel/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    pub title: String,
    pub display_order: i32,
}

/// Body of `PUT /panel/categories/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCategoryPayload {
    pub title: String,
    pub order: i32,
}

/// Body of `POST /panel/products`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub name: String,
    pub price: f64,
    pub is_available: bool,
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_preparation_minutes: Option<u32>,
}

/// One stored file from `POST /files/temp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    pub file_path: String,
}
