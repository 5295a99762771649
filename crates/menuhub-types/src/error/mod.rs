//! Typed failure values for the Menuhub API.
//!
//! Both types are plain data: cloneable so that one refresh failure can be
//! handed to every request that was waiting on it, and serializable so UI
//! layers can forward them as-is.

mod api;
mod auth;

pub use api::ApiFailure;
pub use auth::AuthFailure;
