//! The rendered menu of one business.
//!
//! The menu endpoints are loose about optional fields, so almost everything
//! here defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuData {
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
    #[serde(default)]
    pub business: BusinessProfile,
}

impl MenuData {
    pub fn product_count(&self) -> usize {
        self.categories.iter().map(|c| c.products.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub products: Vec<MenuProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    /// Price after VAT and rounding, computed server-side
    #[serde(default)]
    pub final_price: f64,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub average_preparation_minutes: Option<u32>,
    #[serde(default)]
    pub product_ingredients: Option<String>,
    #[serde(default)]
    pub images: Vec<MenuImage>,
}

impl MenuProduct {
    /// The image with the lowest `order`.
    pub fn cover_image(&self) -> Option<&MenuImage> {
        self.images.iter().min_by_key(|img| img.order)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuImage {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub order: i32,
}

/// Storefront header block: name, logo, address and VAT rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub postal_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub vat_percentage: Option<f64>,
}
