//! In-process blob store

use crate::error::{Result, StoreError};
use crate::store::BlobStore;
use crate::types::StoreStats;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A blob store that keeps everything in memory
///
/// Nothing survives the process. Mostly useful as a fake in tests, which is
/// why writes can be made to fail on demand.
#[derive(Default)]
pub struct MemoryBlobStore {
    entries: RwLock<HashMap<String, Bytes>>,
    fail_writes: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail with [`StoreError::Rejected`]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Whether an entry exists for `key`, without touching the counters
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let found = self.entries.read().await.get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Rejected(format!("put {}", key)));
        }
        self.entries.write().await.insert(key.to_string(), data);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        let entries = self.entries.read().await;
        StoreStats {
            entries: entries.len(),
            total_size: entries.values().map(|b| b.len() as u64).sum(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
