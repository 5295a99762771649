use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Auth endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub sign_in: String,
    pub refresh: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sign_in: "/auth/signin-password".to_string(),
            refresh: "/auth/refresh-token".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin every request path is appended to
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Build from `MENUHUB_API_URL` (required), `MENUHUB_TIMEOUT_SECS` and
    /// `MENUHUB_REFRESH_PATH`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("MENUHUB_API_URL")
            .map_err(|_| ClientError::Config("MENUHUB_API_URL is not set".to_string()))?;
        let mut config = Self::new(base_url);
        if let Some(secs) = std::env::var("MENUHUB_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()) {
            config.timeout_secs = secs;
        }
        if let Ok(path) = std::env::var("MENUHUB_REFRESH_PATH") {
            config.endpoints.refresh = path;
        }
        Ok(config)
    }
}

/// A single file sent as multipart form data.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FilePart {
    pub(crate) fn to_form(&self) -> Result<Form, ClientError> {
        // Rebuilt per dispatch: a Form is consumed on send and a replay needs a fresh one.
        let part = Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| ClientError::Config(format!("invalid content type: {e}")))?;
        Ok(Form::new().part(self.field.clone(), part))
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    File(FilePart),
}

impl RequestBody {
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, ClientError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ClientError::Config(format!("body is not serializable: {e}")))
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, applied after the defaults
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Business scope, sent as `x-slug`
    pub slug: Option<String>,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
    /// Send without a bearer token and never refresh
    pub anonymous: bool,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
