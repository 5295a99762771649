//! Wire models for the Menuhub API.
//!
//! Field names follow the API's camelCase JSON; Rust names are snake_case.

mod business;
mod catalog;
mod envelope;
mod menu;
mod session;

pub use business::{Business, CreateBusinessPayload};
pub use catalog::{
    Category, CreateCategoryPayload, CreateProductPayload, UpdateCategoryPayload, UploadResult,
};
pub use envelope::{ApiResponse, Page};
pub use menu::{BusinessProfile, MenuCategory, MenuData, MenuImage, MenuProduct};
pub use session::{AuthToken, Credential, SessionGrant};
