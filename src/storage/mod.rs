pub mod json_backend;
pub mod persistence;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::errors::{Result, SplitError};

/// Minimal string key-value store, the local-storage analogue the expense
/// list is mirrored into.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store. Clones share the same entries, which lets tests inspect
/// what a store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SplitError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SplitError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SplitError::Storage("memory store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

pub use json_backend::JsonFileStore;
pub use persistence::{ExpensePersistence, EXPENSES_KEY};
