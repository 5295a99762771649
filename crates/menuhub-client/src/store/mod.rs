//! Credential persistence.
//!
//! A session lives on two surfaces, the way a browser keeps it: a key-value
//! storage map for synchronous reads (`sessionId`, `refreshToken`,
//! `fullname`) and two cookies (`sessionId`, `refreshToken`) that
//! server-side route gates look at. [`CredentialStore`] hides the dual write
//! behind a single save/load/clear contract.

mod cookie;
mod file;
mod memory;

pub use cookie::{parse_cookie_header, SameSite, SessionCookie};
pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use menuhub_types::Credential;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key and cookie name of the access token.
pub const SESSION_KEY: &str = "sessionId";
/// Storage key and cookie name of the refresh token.
pub const REFRESH_KEY: &str = "refreshToken";
/// Storage key of the signed-in user's display name.
pub const FULLNAME_KEY: &str = "fullname";

const STORAGE_KEYS: [&str; 3] = [SESSION_KEY, REFRESH_KEY, FULLNAME_KEY];
const COOKIE_NAMES: [&str; 2] = [SESSION_KEY, REFRESH_KEY];

/// Errors raised by credential store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// What a store currently holds. Any field may be missing, e.g. after an
/// out-of-band partial clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub fullname: Option<String>,
    pub access_expires_at: Option<i64>,
    pub refresh_expires_at: Option<i64>,
}

impl StoredSession {
    /// Both tokens are present (validity is not checked).
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

/// Persistence surface for the session credential.
///
/// The gateway re-reads the store on every request and never caches the
/// access token, so changes made elsewhere (another process logging out)
/// are picked up on the next call.
pub trait CredentialStore: Send + Sync {
    /// Current session, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<StoredSession>, StoreError>;

    /// Replace the credential on every surface. `fullname: None` keeps the
    /// stored display name.
    fn save(&self, credential: &Credential, fullname: Option<&str>) -> Result<(), StoreError>;

    /// Remove every session artifact (storage keys and cookies).
    fn clear(&self) -> Result<(), StoreError>;

    fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.and_then(|s| s.access_token))
    }

    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.and_then(|s| s.refresh_token))
    }
}

/// The two surfaces a session is mirrored into. Shared by the in-memory and
/// file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSurfaces {
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

impl SessionSurfaces {
    pub fn write(&mut self, credential: &Credential, fullname: Option<&str>) {
        self.storage.insert(SESSION_KEY.to_string(), credential.access_token.clone());
        self.storage.insert(REFRESH_KEY.to_string(), credential.refresh_token.clone());
        if let Some(name) = fullname {
            self.storage.insert(FULLNAME_KEY.to_string(), name.to_string());
        }

        self.set_cookie(SessionCookie::new(
            SESSION_KEY,
            &credential.access_token,
            credential.access_token_expires_at,
        ));
        self.set_cookie(SessionCookie::new(
            REFRESH_KEY,
            &credential.refresh_token,
            credential.refresh_token_expires_at,
        ));
    }

    pub fn wipe(&mut self) {
        for key in STORAGE_KEYS {
            self.storage.remove(key);
        }
        self.cookies.retain(|c| !COOKIE_NAMES.contains(&c.name.as_str()));
    }

    /// Read the session as of `now`. Storage wins over cookies; expired
    /// cookies count as absent.
    pub fn read(&self, now: i64) -> Option<StoredSession> {
        let session_cookie = self.live_cookie(SESSION_KEY, now);
        let refresh_cookie = self.live_cookie(REFRESH_KEY, now);

        let session = StoredSession {
            access_token: self
                .non_empty(SESSION_KEY)
                .or_else(|| session_cookie.map(|c| c.value.clone())),
            refresh_token: self
                .non_empty(REFRESH_KEY)
                .or_else(|| refresh_cookie.map(|c| c.value.clone())),
            fullname: self.non_empty(FULLNAME_KEY),
            access_expires_at: session_cookie.map(|c| c.expires_at),
            refresh_expires_at: refresh_cookie.map(|c| c.expires_at),
        };

        if session == StoredSession::default() {
            None
        } else {
            Some(session)
        }
    }

    /// Cookies a browser would still send at `now`.
    pub fn live_cookies(&self, now: i64) -> impl Iterator<Item = &SessionCookie> {
        self.cookies.iter().filter(move |c| !c.is_expired(now) && !c.value.is_empty())
    }

    fn live_cookie(&self, name: &str, now: i64) -> Option<&SessionCookie> {
        self.live_cookies(now).find(|c| c.name == name)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set_cookie(&mut self, cookie: SessionCookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
