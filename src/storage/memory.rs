//! In-memory key-value storage, mainly for tests

use super::{validate_key, KeyValueStore};
use crate::error::CartResult;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key-value store backed by a plain `HashMap`
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> CartResult<Option<String>> {
        validate_key(key)?;
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> CartResult<()> {
        validate_key(key)?;
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CartResult<()> {
        validate_key(key)?;
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
