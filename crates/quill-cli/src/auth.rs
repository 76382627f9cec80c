//! Credential storage
//!
//! Stores backend tokens in ~/.config/quill/auth.json with restricted permissions (0o600)

use parking_lot::RwLock;
use quill_agent::{Credentials, SessionContext};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::Config;

/// On-disk form of the session credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAuth {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    /// When the credentials were written, Unix milliseconds
    pub saved_at: i64,
}

impl StoredAuth {
    pub fn new(access_token: String, refresh_token: Option<String>, user_id: Option<String>) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token,
            user_id,
            saved_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

/// Get the credential file path
pub fn auth_file() -> PathBuf {
    Config::config_dir().join("auth.json")
}

/// Load stored credentials, if any
pub fn load_auth(path: &Path) -> Option<StoredAuth> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(auth) => Some(auth),
        Err(e) => {
            tracing::warn!("Ignoring unreadable credential file {}: {}", path.display(), e);
            None
        }
    }
}

/// Write credentials with owner-only permissions
pub fn save_auth(path: &Path, auth: &StoredAuth) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            #[cfg(unix)]
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }

    let content = serde_json::to_string_pretty(auth)?;
    fs::write(path, content)?;

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

/// Delete stored credentials; a missing file is not an error
pub fn remove_auth(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Session backed by the credential file.
///
/// Reads happen against an in-memory copy loaded at startup. Clearing wipes
/// both the copy and the file.
pub struct FileSession {
    path: PathBuf,
    inner: RwLock<Credentials>,
}

impl FileSession {
    /// Load from the default location
    pub fn load() -> Self {
        Self::load_from(auth_file())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let credentials = load_auth(&path)
            .map(|auth| auth.credentials())
            .unwrap_or_default();
        Self {
            path,
            inner: RwLock::new(credentials),
        }
    }

    /// Override the user id for this process only
    pub fn with_user_id(self, user_id: Option<String>) -> Self {
        if let Some(user_id) = user_id {
            self.inner.write().user_id = Some(user_id);
        }
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.read().access_token.is_some()
    }
}

impl SessionContext for FileSession {
    fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.read().refresh_token.clone()
    }

    fn user_id(&self) -> Option<String> {
        self.inner.read().user_id.clone()
    }

    fn clear(&self) {
        *self.inner.write() = Credentials::default();
        if let Err(e) = remove_auth(&self.path) {
            tracing::warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("quill-auth-{}", uuid::Uuid::now_v7()))
            .join("auth.json")
    }

    #[test]
    fn test_save_load_clear() {
        let path = temp_path();
        let auth = StoredAuth::new("tok".into(), Some("refresh".into()), None);
        save_auth(&path, &auth).unwrap();

        #[cfg(unix)]
        {
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let session = FileSession::load_from(path.clone());
        assert!(session.is_logged_in());
        assert_eq!(session.refresh_token().as_deref(), Some("refresh"));

        session.clear();
        assert!(!session.is_logged_in());
        assert!(!path.exists());

        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_missing_file_is_anonymous() {
        let session = FileSession::load_from(temp_path());
        assert!(!session.is_logged_in());
        assert!(session.user_id().is_none());
    }

    #[test]
    fn test_user_override() {
        let session =
            FileSession::load_from(temp_path()).with_user_id(Some("ana@example.com".into()));
        assert_eq!(session.user_id().as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        assert!(remove_auth(&temp_path()).is_ok());
    }
}
