//! Key/value media backing the session store.
//!
//! `MemoryStorage` lives as long as the process. `FileStorage` keeps a single
//! JSON object on disk, by default under the user's runtime dir so it is gone
//! once the host login session ends.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::AuthError;

const SESSION_FILE_NAME: &str = "session.json";

/// Session-scoped key/value medium.
///
/// `write` and `remove` apply all of their keys in one step, so a reader never
/// observes half of a batch.
pub trait SessionStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the medium cannot be written.
    fn write(&self, entries: &[(&str, &str)]) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the medium cannot be written.
    fn remove(&self, keys: &[&str]) -> Result<(), AuthError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, AuthError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, batch: &[(&str, &str)]) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in batch {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// One JSON file holding every key. Replaced via write-then-rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `<dir>/session.json`. The directory is created on first write.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| AuthError::Storage(format!("parse {}: {e}", self.path.display())))
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(AuthError::Storage(format!(
                    "delete {}: {e}",
                    self.path.display()
                ))),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        let body = serde_json::to_string(entries)
            .map_err(|e| AuthError::Storage(format!("serialize session: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .map_err(|e| AuthError::Storage(format!("write {}: {e}", tmp.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
                .map_err(|e| AuthError::Storage(format!("chmod {}: {e}", tmp.display())))?;
        }

        fs::rename(&tmp, &self.path).map_err(|e| {
            AuthError::Storage(format!("rename to {}: {e}", self.path.display()))
        })
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.remove(key))
    }

    fn write(&self, batch: &[(&str, &str)]) -> Result<(), AuthError> {
        let mut entries = self.load().unwrap_or_else(|error| {
            tracing::warn!(%error, "session file unreadable; starting from empty");
            BTreeMap::new()
        });
        for (key, value) in batch {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&entries)
    }

    fn remove(&self, keys: &[&str]) -> Result<(), AuthError> {
        let mut entries = self.load().unwrap_or_else(|error| {
            tracing::warn!(%error, "session file unreadable; discarding it");
            BTreeMap::new()
        });
        for key in keys {
            entries.remove(*key);
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_write_read_remove_cycle() {
        let storage = MemoryStorage::new();
        storage.write(&[("a", "1"), ("b", "2")]).expect("write");
        assert_eq!(storage.read("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.read("b").unwrap().as_deref(), Some("2"));

        storage.remove(&["a", "b"]).expect("remove");
        assert!(storage.read("a").unwrap().is_none());
        assert!(storage.read("b").unwrap().is_none());
    }

    #[test]
    fn file_missing_reads_as_empty() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let storage = FileStorage::in_dir(tmp.path());
        assert!(storage.read("accessToken").unwrap().is_none());
    }

    #[test]
    fn file_write_is_visible_to_a_second_handle() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        FileStorage::in_dir(tmp.path())
            .write(&[("accessToken", "t"), ("user", "{}")])
            .expect("write");

        let reopened = FileStorage::in_dir(tmp.path());
        assert_eq!(reopened.read("accessToken").unwrap().as_deref(), Some("t"));
        assert_eq!(reopened.read("user").unwrap().as_deref(), Some("{}"));
        assert!(!tmp.path().join("session.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let storage = FileStorage::in_dir(tmp.path().join("nested"));
        storage.write(&[("k", "v")]).expect("write");

        let mode = fs::metadata(storage.path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "session file should be 0600");
    }

    #[test]
    fn removing_last_key_deletes_file() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let storage = FileStorage::in_dir(tmp.path());
        storage.write(&[("k", "v")]).expect("write");
        assert!(storage.path().exists());

        storage.remove(&["k"]).expect("remove");
        assert!(!storage.path().exists());
        storage.remove(&["k"]).expect("second remove is a no-op");
    }

    #[test]
    fn corrupt_file_surfaces_on_read_and_is_replaced_on_write() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let storage = FileStorage::in_dir(tmp.path());
        fs::write(storage.path(), "{not json").expect("seed");

        assert!(matches!(storage.read("k"), Err(AuthError::Storage(_))));
        storage.write(&[("k", "v")]).expect("write");
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v"));
    }
}
