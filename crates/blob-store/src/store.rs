//! The store interface shared by every backend

use crate::error::Result;
use crate::types::StoreStats;
use async_trait::async_trait;
use bytes::Bytes;

/// Keyed blob storage with atomic per-key get and put
///
/// A `put` fully replaces any previous payload for the key. Implementations
/// must be safe to share between independent consumers without extra locking
/// on their side.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Look up the payload stored for `key`
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `data` under `key`, overwriting any existing entry
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Remove the entry for `key`, returning whether one existed
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Remove every entry
    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> StoreStats;
}
