//! Directory listing cache

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use openapi_client::models::FilesResponse;

/// Directory listing cache entry
#[derive(Debug, Clone)]
pub struct FilesCacheEntry {
    pub listing: FilesResponse,
    pub cached_at: Instant,
}

impl FilesCacheEntry {
    pub fn is_fresh(&self, stale_after: Duration) -> bool {
        self.cached_at.elapsed() < stale_after
    }
}

/// In-memory listing cache keyed by encoded directory path ("" is the root)
pub struct FilesCache {
    entries: RwLock<HashMap<String, FilesCacheEntry>>,
    stale_after: Duration,
}

impl FilesCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_after,
        }
    }

    pub fn get(&self, path: &str) -> Option<FilesCacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).cloned()
    }

    /// Cached listing, unless it has gone stale
    pub fn get_fresh(&self, path: &str) -> Option<FilesResponse> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(path)
            .filter(|entry| entry.is_fresh(self.stale_after))
            .map(|entry| entry.listing.clone())
    }

    pub fn insert(&self, path: &str, listing: FilesResponse) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            path.to_string(),
            FilesCacheEntry {
                listing,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop the listing of a single directory
    pub fn invalidate(&self, path: &str) -> Option<FilesCacheEntry> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(path)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
