//! Persistent storage for plugin configuration.
//!
//! Each plugin's configuration is stored as one JSON value under its key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::utils::fs::{read_optional, write_atomic};
use crate::{Error, Result};

/// Storage key of the digest configuration.
pub const DIGEST_CONFIG_KEY: &str = "subscribe_digest";
/// Storage key of the default image configuration.
pub const DEFAULT_IMAGE_CONFIG_KEY: &str = "default_image";
/// Storage key of the host logging configuration.
pub const LOGGING_CONFIG_KEY: &str = "logging";

/// Key/value store of plugin configuration documents.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`.
    async fn save(&self, key: &str, value: Value) -> Result<()>;
}

/// A single JSON document on disk holding every plugin's configuration.
pub struct JsonFileConfigStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let Some(content) = read_optional("reading config", &self.path).await? else {
            return Ok(Map::new());
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::config(format!(
                "{} must contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    async fn save(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;
        write_atomic("writing config", &self.path, &bytes).await?;

        debug!(key, path = %self.path.display(), "Config saved");
        Ok(())
    }
}

/// In-memory store, used when no file is configured and in tests.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: parking_lot::RwLock<HashMap<String, Value>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConfigStore::new(dir.path().join("plugins.json"));
        assert!(store.load(DIGEST_CONFIG_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConfigStore::new(dir.path().join("plugins.json"));

        store
            .save(DIGEST_CONFIG_KEY, json!({"enabled": true}))
            .await
            .unwrap();
        store
            .save(DEFAULT_IMAGE_CONFIG_KEY, json!({"enabled": false}))
            .await
            .unwrap();

        assert_eq!(
            store.load(DIGEST_CONFIG_KEY).await.unwrap(),
            Some(json!({"enabled": true}))
        );
        assert_eq!(
            store.load(DEFAULT_IMAGE_CONFIG_KEY).await.unwrap(),
            Some(json!({"enabled": false}))
        );
    }

    #[tokio::test]
    async fn test_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugins.json");
        tokio::fs::write(&path, "[1, 2]").await.unwrap();

        let store = JsonFileConfigStore::new(path);
        assert!(matches!(
            store.load(DIGEST_CONFIG_KEY).await,
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryConfigStore::new();
        assert!(store.load("k").await.unwrap().is_none());
        store.save("k", json!(1)).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(json!(1)));
    }
}
