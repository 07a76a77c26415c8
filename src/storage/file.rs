//! File-backed key-value storage
//!
//! One file per key under a state directory, so a guest cart survives
//! application restarts the way a browser's localStorage would.

use super::{validate_key, KeyValueStore};
use crate::error::{CartError, CartResult};
use std::path::PathBuf;
use tracing::debug;

/// Key-value store persisting each key as a file under `dir`
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: PathBuf) -> CartResult<Self> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| CartError::io(format!("creating state dir {}", dir.display()), e))?;
        Ok(Self { dir })
    }

    /// Create a store at the default state directory
    pub fn open_default() -> CartResult<Self> {
        Self::new(Self::default_dir())
    }

    /// Default state directory for client-local data
    pub fn default_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookstall")
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> CartResult<Option<String>> {
        validate_key(key)?;
        let path = self.key_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let value = std::fs::read_to_string(&path)
            .map_err(|e| CartError::io(format!("reading state file {}", path.display()), e))?;
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &str) -> CartResult<()> {
        validate_key(key)?;
        let path = self.key_path(key);

        std::fs::write(&path, value)
            .map_err(|e| CartError::io(format!("writing state file {}", path.display()), e))?;
        debug!("Persisted state key {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> CartResult<()> {
        validate_key(key)?;
        let path = self.key_path(key);

        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CartError::io(format!("removing state file {}", path.display()), e))?;
            debug!("Removed state key {}", key);
        }
        Ok(())
    }
}
