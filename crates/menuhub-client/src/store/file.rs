use std::fs;
use std::path::{Path, PathBuf};

use menuhub_types::Credential;
use parking_lot::Mutex;

use super::{unix_now, CredentialStore, SessionSurfaces, StoreError, StoredSession};

const SESSION_FILE: &str = "session.json";

/// JSON-file store. Every write goes to a temp file that is renamed over the
/// target, so readers never see a half-written session.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// `<config dir>/menuhub/session.json`.
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir.join("menuhub").join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_surfaces(&self) -> Result<SessionSurfaces, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(SessionSurfaces::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionSurfaces::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_surfaces(&self, surfaces: &SessionSurfaces) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(surfaces)?)?;
        restrict_permissions(&temp_path)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut SessionSurfaces)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut surfaces = self.read_surfaces()?;
        f(&mut surfaces);
        self.write_surfaces(&surfaces)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.read_surfaces()?.read(unix_now()))
    }

    fn save(&self, credential: &Credential, fullname: Option<&str>) -> Result<(), StoreError> {
        self.update(|s| s.write(credential, fullname))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(SessionSurfaces::wipe)
    }
}
