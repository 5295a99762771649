#![doc = include_str!("../README.md")]

mod client;
mod endpoints;
mod error;
mod refresh;
mod route_gate;
mod types;

pub mod store;

pub use client::{bearer_value, MenuClient, RawResponse, SLUG_HEADER};
pub use endpoints::PageQuery;
pub use error::{ClientError, ResponseExt};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use route_gate::{has_session, RouteDecision, RouteGate};
pub use store::{CredentialStore, FileStore, MemoryStore, StoreError, StoredSession};
pub use types::{ClientConfig, Endpoints, FilePart, RequestBody, RequestOptions};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
