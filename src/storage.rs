//! Shared key-value store for data exchanged between jobs and the
//! controlling context.
//!
//! Values are stored as JSON values so arbitrary serializable types can be
//! passed through without this crate imposing a schema. The store is owned
//! by the [`JobQueue`](crate::queue::JobQueue) facade and shared with
//! running jobs through their [`JobContext`](crate::scheduler::JobContext).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Thread-safe map of string keys to JSON values.
#[derive(Debug, Default)]
pub struct GlobalStorage {
    values: RwLock<HashMap<String, Value>>,
}

impl GlobalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.values.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize `value` and store it under `key`, replacing any previous
    /// value.
    pub fn insert(&self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.write().insert(key.into(), value);
        Ok(())
    }

    /// Raw JSON value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Deserialize the value stored under `key` into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the
    /// stored value does not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Write the whole store to `path` as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &*self.read())?;
        Ok(())
    }

    /// Merge the JSON map in `path` into the store. Existing keys are
    /// overwritten by loaded ones.
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path)?;
        let loaded: HashMap<String, Value> = serde_json::from_reader(file)?;
        self.write().extend(loaded);
        Ok(())
    }

    /// Write the whole store to `path` as YAML.
    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(file, &*self.read())?;
        Ok(())
    }

    /// Merge the YAML map in `path` into the store. Existing keys are
    /// overwritten by loaded ones.
    pub fn load_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path)?;
        let loaded: HashMap<String, Value> = serde_yaml::from_reader(file)?;
        self.write().extend(loaded);
        Ok(())
    }
}
