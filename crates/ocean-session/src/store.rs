//! Best-effort key/value persistence with JSON values

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Raw key/value storage medium
pub trait Store: Send + Sync {
    /// Read the raw value stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the raw value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Load a JSON value, falling back to `default` when it is absent,
/// unreadable or malformed.
pub fn load<T: DeserializeOwned>(store: &dyn Store, key: &str, default: T) -> T {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            tracing::warn!("Failed to read '{}' from store: {}", key, e);
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring malformed stored data for '{}': {}", key, e);
            default
        }
    }
}

/// Save a JSON value. Failures are logged and otherwise ignored.
pub fn save<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(Error::from)
        .and_then(|raw| store.write(key, &raw));
    if let Err(e) = result {
        tracing::warn!("Failed to save '{}' to store: {}", key, e);
    }
}

/// Process-local storage that lives as long as the process
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable storage keeping one `<key>.json` file per key in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Default storage directory (`<data_local_dir>/ocean-chat`)
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("ocean-chat"))
    }

    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        if !dir.is_dir() {
            return Err(Error::StorageUnavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    /// The directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl Store for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Open a file store at `dir` (or the default directory), falling back to
/// memory for this run when the medium is unavailable.
pub fn open_default_store(dir: Option<PathBuf>) -> Arc<dyn Store> {
    let Some(dir) = dir.or_else(FileStore::default_dir) else {
        tracing::warn!("No data directory available, conversation will not persist");
        return Arc::new(MemoryStore::new());
    };

    match FileStore::open(&dir) {
        Ok(store) => {
            tracing::debug!("Persisting conversation under {}", dir.display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Storage at {} unavailable ({}), conversation will not persist",
                dir.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
