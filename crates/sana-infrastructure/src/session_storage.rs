//! Persisted session storage.
//!
//! Stores the session (bearer token + cached user record) as a single JSON
//! file under the sana config directory. Writes are atomic via tmp file +
//! rename; the file carries 600 permissions on Unix since it holds a token.

use crate::paths::SanaPaths;
use sana_core::error::{Result, SanaError};
use sana_core::session::{Session, SessionStore};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

/// File-backed [`SessionStore`].
///
/// Responsibilities:
/// - Load `session.json` from the config directory (missing file = empty
///   session, a parse failure is an error the caller treats as a corrupt
///   session)
/// - Save atomically (tmp file + fsync + rename)
/// - Clear on logout, after which no token is retrievable
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store at the default path (`~/.config/sana/session.json`).
    pub fn new() -> Result<Self> {
        let path = SanaPaths::session_file()
            .map_err(|e| SanaError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path to the session file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| SanaError::io("Session path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| SanaError::io("Session path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Session::default());
        }

        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(session)?;

        // Write to a temporary file in the same directory, then rename.
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        // Token material: user read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sana_core::user::UserRecord;
    use tempfile::TempDir;

    fn user() -> UserRecord {
        UserRecord {
            id: 1,
            full_name: "Asuna Yuuki".to_string(),
            email: "asuna@example.com".to_string(),
            dob: "2007-09-30".to_string(),
            gender: "female".to_string(),
            nationality: "Japanese".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));

        let session = store.load().unwrap();
        assert!(session.token.is_none());
        assert!(session.user.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));

        let session = Session::signed_in("tok-123", user());
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            FileSessionStore::with_path(temp_dir.path().join("nested/dir/session.json"));

        store.save(&Session::signed_in("tok", user())).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));

        store.save(&Session::signed_in("tok", user())).unwrap();
        assert!(!temp_dir.path().join(".session.json.tmp").exists());
    }

    #[test]
    fn test_clear_removes_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));

        store.save(&Session::signed_in("tok", user())).unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        let session = store.load().unwrap();
        assert!(!session.has_token());
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::with_path(path);
        let result = store.load();
        assert!(matches!(result, Err(SanaError::Serialization { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(temp_dir.path().join("session.json"));
        store.save(&Session::signed_in("tok", user())).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
