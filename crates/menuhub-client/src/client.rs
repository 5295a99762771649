use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use menuhub_types::{ApiFailure, ApiResponse, AuthFailure, Credential, SessionGrant};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::error::ClientError;
use crate::refresh::RefreshCoordinator;
use crate::store::CredentialStore;
use crate::types::{ClientConfig, RequestBody, RequestOptions};

/// Header that scopes panel requests to one business.
pub const SLUG_HEADER: &str = "x-slug";

/// Replays allowed per logical request after a 401.
const MAX_AUTH_RETRIES: u8 = 1;

const BODY_PREVIEW_CHARS: usize = 200;

/// Headers the gateway sets itself; caller-supplied copies are dropped.
const RESERVED_HEADERS: [&str; 2] = ["authorization", SLUG_HEADER];

fn is_reserved_header(name: &str) -> bool {
    RESERVED_HEADERS.iter().any(|r| name.trim().eq_ignore_ascii_case(r))
}

/// `Authorization` value for a stored token, whether or not the token
/// already carries the `Bearer ` prefix.
pub fn bearer_value(token: &str) -> String {
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    format!("Bearer {}", token.trim_start())
}

/// Status and body of a 2xx response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ClientError::InvalidResponse(format!("{e} (body: {})", preview(&self.body)))
        })
    }

    /// Parse the response envelope.
    ///
    /// `isSuccess: false` is reported as [`ClientError::Rejected`] before
    /// `data` is decoded, so a failure with `data: null` keeps the server's
    /// messages.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<ApiResponse<T>, ClientError> {
        envelope_from_value(self.status, self.json()?)
    }
}

/// Whether a JSON body is wrapped in the envelope rather than bare.
pub(crate) fn is_envelope(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("data") || o.contains_key("isSuccess"))
}

pub(crate) fn envelope_from_value<T: DeserializeOwned>(
    status: StatusCode,
    value: Value,
) -> Result<ApiResponse<T>, ClientError> {
    let head: ApiResponse<Option<Value>> = serde_json::from_value(value)
        .map_err(|e| ClientError::InvalidResponse(format!("not a response envelope: {e}")))?;

    if !head.is_success {
        return Err(ClientError::Rejected(ApiFailure {
            status: status.as_u16(),
            message: head.message,
            messages: head.messages,
            errors: head.errors,
        }));
    }

    let data = serde_json::from_value(head.data.unwrap_or(Value::Null))
        .map_err(|e| ClientError::InvalidResponse(format!("unexpected envelope data: {e}")))?;
    Ok(ApiResponse {
        data,
        is_success: true,
        message: head.message,
        messages: head.messages,
        errors: head.errors,
    })
}

/// Authenticated request gateway for the Menuhub API.
///
/// Attaches the stored bearer token to every request, and on a 401 refreshes
/// the session once (shared across all concurrent callers) and replays the
/// request. Cheap to clone; clones share the store and the refresh state.
#[derive(Clone)]
pub struct MenuClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: Url,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    refresh: Arc<RefreshCoordinator>,
}

impl MenuClient {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base URL must be http or https, got {}",
                base_url.scheme()
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                config,
                store,
                refresh: Arc::new(RefreshCoordinator::new()),
            }),
        })
    }

    /// Client configured from the environment (see [`ClientConfig::from_env`]).
    pub fn from_env(store: Arc<dyn CredentialStore>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?, store)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Perform one logical call and parse the response envelope.
    ///
    /// A 401 triggers at most one refresh-and-replay; any other non-2xx is
    /// returned as an error carrying the status and envelope messages, and a
    /// 2xx envelope with `isSuccess: false` as [`ClientError::Rejected`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request_raw(method, path, body, options).await?.envelope()
    }

    /// Like [`request`](Self::request) but hands back the undecoded body.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<RawResponse, ClientError> {
        let call = Call { method, path: path.to_string(), body, options };
        let span = tracing::debug_span!(
            "api_request",
            method = %call.method,
            path = %call.path,
            request_id = %Uuid::new_v4(),
        );

        match call.options.cancel.clone() {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(path = %call.path, "Request cancelled by caller");
                        Err(ClientError::Cancelled)
                    },
                    result = self.execute(&call).instrument(span) => result,
                }
            },
            None => self.execute(&call).instrument(span).await,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::POST, path, Some(RequestBody::json(body)?), options).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::PUT, path, Some(RequestBody::json(body)?), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::DELETE, path, None, options).await
    }

    /// Sign in with username and password and persist the issued credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, ClientError> {
        let url = self.inner.url(&self.inner.config.endpoints.sign_in)?;
        let resp = self
            .inner
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&SignInRequest { username, password })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_client_error() {
            let failure = failure_from_body(status, &body);
            tracing::info!(status = status.as_u16(), "Sign-in rejected");
            return Err(AuthFailure::rejected(status.as_u16(), failure.summary()).into());
        }
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let grant = match (RawResponse { status, body }).envelope::<SessionGrant>() {
            Ok(envelope) => envelope.data,
            Err(ClientError::Rejected(failure)) => {
                tracing::info!(status = status.as_u16(), "Sign-in rejected");
                return Err(AuthFailure::rejected(failure.status, failure.summary()).into());
            },
            Err(e) => return Err(e),
        };

        let credential = Credential::from(grant.access_token);
        self.inner.store.save(&credential, grant.fullname.as_deref())?;
        tracing::info!(user = grant.fullname.as_deref().unwrap_or("-"), "Signed in");
        Ok(credential)
    }

    /// Clear every persisted credential artifact. Does not call the server.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.inner.store.clear()?;
        tracing::info!("Signed out, session cleared");
        Ok(())
    }

    /// Refresh the session now, joining a refresh that is already running.
    /// Returns the new access token.
    pub async fn refresh_session(&self) -> Result<String, ClientError> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .refresh
            .run_exclusive(move || async move { inner.perform_refresh().await })
            .await
            .map_err(ClientError::Authentication)
    }

    async fn execute(&self, call: &Call) -> Result<RawResponse, ClientError> {
        let mut token =
            if call.options.anonymous { None } else { self.inner.store.access_token()? };
        let mut attempt: u8 = 0;

        loop {
            let resp = self.inner.dispatch(call, token.as_deref()).await?;
            let status = resp.status();

            if status != StatusCode::UNAUTHORIZED || call.options.anonymous {
                let body = resp.bytes().await?;
                if status.is_success() {
                    tracing::debug!(status = status.as_u16(), attempt, "Request completed");
                    return Ok(RawResponse { status, body });
                }
                tracing::debug!(status = status.as_u16(), attempt, "Request failed");
                return Err(classify_failure(status, &body));
            }

            if attempt >= MAX_AUTH_RETRIES {
                tracing::warn!("Still unauthorized after token refresh, giving up");
                return Err(AuthFailure::unauthorized_after_replay().into());
            }
            attempt += 1;

            token = Some(self.recover_unauthorized(token.as_deref()).await?);
            tracing::debug!(attempt, "Replaying request with refreshed token");
        }
    }

    /// Obtain a token to replay with after a 401 on `sent`.
    ///
    /// If a refresh already rotated the stored token while this request was
    /// in flight, replay with that token instead of refreshing again.
    async fn recover_unauthorized(&self, sent: Option<&str>) -> Result<String, ClientError> {
        if !self.inner.refresh.is_refreshing() {
            if let Some(current) = self.inner.store.access_token()? {
                let rotated = sent.map_or(true, |s| bearer_value(s) != bearer_value(&current));
                if rotated {
                    tracing::debug!("Stored token changed while request was in flight");
                    return Ok(current);
                }
            }
        }
        self.refresh_session().await
    }
}

impl Inner {
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ClientError::Config(format!("invalid path {path:?}: {e}")))
    }

    async fn dispatch(
        &self,
        call: &Call,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self
            .http
            .request(call.method.clone(), self.url(&call.path)?)
            .header(ACCEPT, "application/json");

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, bearer_value(token));
        }
        if let Some(slug) = &call.options.slug {
            builder = builder.header(SLUG_HEADER, slug.as_str());
        }
        for (name, value) in &call.options.headers {
            if is_reserved_header(name) {
                tracing::debug!(header = %name, "Ignoring caller header managed by the gateway");
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !call.options.query.is_empty() {
            builder = builder.query(&call.options.query);
        }
        if let Some(timeout) = call.options.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match &call.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::File(part)) => builder.multipart(part.to_form()?),
            None => builder,
        };

        builder.send().await.map_err(|e| {
            if e.is_builder() {
                ClientError::Config(e.to_string())
            } else {
                ClientError::Network(e)
            }
        })
    }

    /// The refresh itself. Persists the rotated credential on success; on
    /// any failure the session is terminated before the error is returned.
    async fn perform_refresh(&self) -> Result<String, AuthFailure> {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!("No refresh token stored, terminating session");
                self.terminate_session();
                return Err(AuthFailure::missing_refresh_token());
            },
            Err(e) => {
                self.terminate_session();
                return Err(AuthFailure::refresh_failed(e));
            },
        };

        let grant = match self.call_refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(failure) => {
                tracing::warn!(%failure, "Token refresh failed, terminating session");
                self.terminate_session();
                return Err(failure);
            },
        };

        let credential = Credential::from(grant.access_token);
        if let Err(e) = self.store.save(&credential, grant.fullname.as_deref()) {
            tracing::error!("Failed to persist refreshed credential: {}", e);
            self.terminate_session();
            return Err(AuthFailure::refresh_failed(e));
        }

        tracing::info!("Session refreshed");
        Ok(credential.access_token)
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<SessionGrant, AuthFailure> {
        let url = self.url(&self.config.endpoints.refresh).map_err(AuthFailure::refresh_failed)?;
        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(AuthFailure::refresh_failed)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(AuthFailure::refresh_failed)?;

        if !status.is_success() {
            let failure = failure_from_body(status, &body);
            return Err(AuthFailure::rejected(status.as_u16(), failure.summary()));
        }

        let malformed = |reason: &dyn std::fmt::Display| {
            AuthFailure::refresh_failed(format!(
                "malformed refresh response: {reason} (body: {})",
                preview(&body)
            ))
        };

        let value: Value = serde_json::from_slice(&body).map_err(|e| malformed(&e))?;
        if !is_envelope(&value) {
            return serde_json::from_value(value).map_err(|e| malformed(&e));
        }
        match envelope_from_value::<SessionGrant>(status, value) {
            Ok(envelope) => Ok(envelope.data),
            Err(ClientError::Rejected(failure)) => {
                Err(AuthFailure::rejected(failure.status, failure.summary()))
            },
            Err(e) => Err(malformed(&e)),
        }
    }

    fn terminate_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear session: {}", e);
        }
    }
}

/// One logical request, reused verbatim for the replay.
struct Call {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    options: RequestOptions,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Loose view of an error body: the envelope, or ASP.NET-style problem
/// details whose `errors` is a field map.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    title: Option<String>,
    messages: Option<Vec<String>>,
    errors: Option<Value>,
}

fn failure_from_body(status: StatusCode, body: &[u8]) -> ApiFailure {
    let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) else {
        let text = preview(body);
        return ApiFailure::bare(status.as_u16(), (!text.is_empty()).then_some(text));
    };

    ApiFailure {
        status: status.as_u16(),
        message: parsed.message.or(parsed.title),
        messages: parsed.messages.unwrap_or_default(),
        errors: parsed.errors.map(flatten_errors).unwrap_or_default(),
    }
}

fn flatten_errors(errors: Value) -> Vec<String> {
    match errors {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Value::Object(fields) => fields
            .into_iter()
            .flat_map(|(field, msgs)| match msgs {
                Value::Array(list) => list
                    .into_iter()
                    .map(|m| format!("{field}: {}", m.as_str().map_or_else(|| m.to_string(), String::from)))
                    .collect::<Vec<_>>(),
                Value::String(s) => vec![format!("{field}: {s}")],
                other => vec![format!("{field}: {other}")],
            })
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    }
}

fn classify_failure(status: StatusCode, body: &[u8]) -> ClientError {
    let failure = failure_from_body(status, body);
    if status == StatusCode::UNAUTHORIZED {
        ClientError::Authentication(AuthFailure::rejected(401, failure.summary()))
    } else if status.is_client_error() {
        ClientError::Validation(failure)
    } else if status.is_server_error() {
        ClientError::Server(failure)
    } else {
        ClientError::InvalidResponse(format!("unexpected status {status}"))
    }
}

fn preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect()
}
