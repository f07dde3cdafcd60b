//! Pluggable key-value persistence for client state

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::ConsoleError;
use crate::filesys::file::File;

/// Durable string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ConsoleError>;

    async fn set(&self, key: &str, value: String) -> Result<(), ConsoleError>;

    async fn remove(&self, key: &str) -> Result<(), ConsoleError>;
}

/// In-process store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ConsoleError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ConsoleError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file. Every write rewrites the file
/// atomically with owner-only permissions.
#[derive(Debug)]
pub struct FileKvStore {
    file: Arc<File>,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileKvStore {
    pub fn new(file: Arc<File>) -> Self {
        Self {
            file,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, ConsoleError> {
        self.file
            .read_json_opt::<HashMap<String, String>>()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                ConsoleError::StorageError(format!(
                    "Failed to read {}: {}",
                    self.file.path().display(),
                    e
                ))
            })
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), ConsoleError> {
        if entries.is_empty() {
            debug!("Store empty, removing {}", self.file.path().display());
            return self.file.delete().await;
        }
        self.file.write_json(entries).await?;
        self.file.set_permissions_600().await
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
