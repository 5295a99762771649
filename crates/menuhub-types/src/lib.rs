//! # Menuhub Types
//!
//! Domain models and failure values for the Menuhub digital-menu API.
//!
//! This crate provides the foundational type system shared by the gateway and
//! its callers:
//!
//! - **`error`** - Cloneable failure values (`AuthFailure`, `ApiFailure`)
//! - **`models`** - Wire models (envelope, credential, business, catalog, menu)
//!
//! ## Architecture Role
//!
//! `menuhub-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          menuhub-types (this crate)
//!                  │
//!                  ▼
//!           menuhub-client
//!                  │
//!                  ▼
//!            menuhub-cli
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde, matching the API's camelCase wire format
//! - **Clone** so a single outcome can be handed to many waiters
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

pub use error::{ApiFailure, AuthFailure};

pub use models::{
    ApiResponse, AuthToken, Business, BusinessProfile, Category, CreateBusinessPayload,
    CreateCategoryPayload, CreateProductPayload, Credential, MenuCategory, MenuData, MenuImage,
    MenuProduct, Page, SessionGrant, UpdateCategoryPayload, UploadResult,
};
