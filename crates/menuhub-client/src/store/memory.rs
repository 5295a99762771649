use menuhub_types::Credential;
use parking_lot::Mutex;

use super::{unix_now, CredentialStore, SessionSurfaces, StoreError, StoredSession};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    surfaces: Mutex<SessionSurfaces>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential, as if a login had just happened.
    pub fn with_credential(credential: &Credential, fullname: Option<&str>) -> Self {
        let store = Self::new();
        store.surfaces.lock().write(credential, fullname);
        store
    }

    /// Copy of both surfaces, for inspection.
    pub fn snapshot(&self) -> SessionSurfaces {
        self.surfaces.lock().clone()
    }

    /// Overwrite the access token in storage only, leaving cookies alone.
    pub fn set_access_token(&self, token: &str) {
        self.surfaces.lock().storage.insert(super::SESSION_KEY.to_string(), token.to_string());
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.surfaces.lock().read(unix_now()))
    }

    fn save(&self, credential: &Credential, fullname: Option<&str>) -> Result<(), StoreError> {
        self.surfaces.lock().write(credential, fullname);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.surfaces.lock().wipe();
        Ok(())
    }
}
