use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ServiceError;

/// Key-value persistence collaborator. Collections are stored as whole
/// JSON documents keyed by name; there is no schema versioning and no
/// migration logic. A missing key means "start empty/default".
pub trait StorageBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, ServiceError>;
    fn save(&self, key: &str, value: &str) -> Result<(), ServiceError>;
    fn remove(&self, key: &str) -> Result<(), ServiceError>;
    /// Drops every stored document. Used by the full data reset.
    fn clear(&self) -> Result<(), ServiceError>;
}

/// One `<key>.json` file per collection under a data directory.
///
/// Writes are whole-document overwrites, not appends, so concurrent writers
/// (two processes on one data dir) are last-write-wins by design.
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), ServiceError> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// HashMap-backed storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ServiceError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), ServiceError> {
        self.entries.lock().clear();
        Ok(())
    }
}
