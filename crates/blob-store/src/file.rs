//! File-backed blob store with in-memory metadata

use crate::error::{Result, StoreError};
use crate::store::BlobStore;
use crate::types::{EntryMeta, StoreStats, DEFAULT_NAMESPACE, SCHEMA_VERSION};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

const VERSION_FILE: &str = "VERSION";
const TMP_MARKER: &str = ".tmp-";
/// Temp files older than this are treated as left by a crashed writer
const STALE_TMP_AGE: Duration = Duration::from_secs(60 * 60);

/// A blob store keeping one file per entry under `<root>/<namespace>/`
///
/// Nothing touches the filesystem until the first operation, which creates
/// the namespace directory, writes the schema version marker and loads
/// metadata for entries left by earlier sessions. Several stores may share
/// one directory; entries written through one are visible to the others.
pub struct FileBlobStore {
    dir: PathBuf,
    /// Size bound in bytes; `None` keeps every entry
    max_size: Option<u64>,
    ready: OnceCell<()>,
    entries: RwLock<HashMap<String, EntryMeta>>,
    current_size: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl FileBlobStore {
    /// Open the default `audio-files` namespace under `root`
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_namespace(root, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(root: impl Into<PathBuf>, namespace: &str) -> Self {
        Self {
            dir: root.into().join(namespace),
            max_size: None,
            ready: OnceCell::new(),
            entries: RwLock::new(HashMap::new()),
            current_size: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Bound the total payload size, evicting the oldest entries first
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Directory holding this namespace's entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a key: hex SHA-256, so any key is a safe file name
    pub fn entry_name(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let version_path = self.dir.join(VERSION_FILE);
        match fs::read_to_string(&version_path).await {
            Ok(found) => {
                if found.trim() != SCHEMA_VERSION.to_string() {
                    return Err(StoreError::SchemaVersion {
                        found: found.trim().to_string(),
                        expected: SCHEMA_VERSION,
                    });
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Another store may be reading it concurrently
                self.write_atomic(VERSION_FILE, Bytes::from(SCHEMA_VERSION.to_string()))
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        let mut loaded = HashMap::new();
        let mut total = 0u64;
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            if name == VERSION_FILE {
                continue;
            }
            let meta = match item.metadata().await {
                Ok(meta) => meta,
                // Renamed or removed by another store since the listing
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if name.contains(TMP_MARKER) {
                // Fresh ones may belong to a write still in progress
                if is_stale(&meta) {
                    let _ = fs::remove_file(item.path()).await;
                }
                continue;
            }
            if !meta.is_file() {
                continue;
            }
            let written_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            total += meta.len();
            loaded.insert(
                name,
                EntryMeta {
                    size: meta.len(),
                    written_at,
                },
            );
        }

        let count = loaded.len();
        *self.entries.write().await = loaded;
        self.current_size.store(total, Ordering::Relaxed);
        info!(dir = ?self.dir, entries = count, total_size = total, "Blob store opened");
        Ok(())
    }

    /// Evict oldest entries until `new_size` bytes fit in place of `replacing`
    async fn evict_if_needed(&self, new_size: u64, replacing: &str) {
        let Some(max_size) = self.max_size else {
            return;
        };

        let target_size = max_size.saturating_sub(new_size);

        loop {
            let (current, oldest) = {
                let entries = self.entries.read().await;
                let replaced = entries.get(replacing).map_or(0, |e| e.size);
                let current = self
                    .current_size
                    .load(Ordering::Relaxed)
                    .saturating_sub(replaced);
                let oldest = entries
                    .iter()
                    .filter(|(name, _)| name.as_str() != replacing)
                    .min_by_key(|(_, e)| e.written_at)
                    .map(|(name, _)| name.clone());
                (current, oldest)
            };

            if current <= target_size {
                break;
            }

            match oldest {
                Some(name) => {
                    self.remove_entry(&name).await;
                    debug!(entry = %name, "Evicted oldest store entry");
                }
                None => break,
            }
        }
    }

    /// Drop an entry's metadata and file, returning whether it was tracked
    async fn remove_entry(&self, name: &str) -> bool {
        let removed = self.entries.write().await.remove(name);
        let tracked = removed.is_some();
        if let Some(meta) = removed {
            self.current_size.fetch_sub(meta.size, Ordering::Relaxed);
        }

        if let Err(e) = fs::remove_file(self.dir.join(name)).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(entry = %name, error = %e, "Failed to remove store file");
            }
        }
        tracked
    }

    /// Write `name` through a temp file so readers never see a partial
    /// payload; the temp name is unique even across stores sharing the
    /// directory
    async fn write_atomic(&self, name: &str, data: Bytes) -> Result<()> {
        let dir = self.dir.clone();
        let target = self.dir.join(name);
        let prefix = format!("{}{}", name, TMP_MARKER);
        tokio::task::spawn_blocking(move || write_through_temp(&dir, &prefix, &target, &data))
            .await
            .map_err(|e| io::Error::new(ErrorKind::Other, e))??;
        Ok(())
    }

    /// Pick up an entry another store wrote into the shared directory
    async fn track_if_untracked(&self, name: &str, size: u64) {
        if self.entries.read().await.contains_key(name) {
            return;
        }
        if let Entry::Vacant(slot) = self.entries.write().await.entry(name.to_string()) {
            slot.insert(EntryMeta {
                size,
                written_at: Utc::now(),
            });
            self.current_size.fetch_add(size, Ordering::Relaxed);
        }
    }
}

fn is_stale(meta: &std::fs::Metadata) -> bool {
    meta.modified()
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age >= STALE_TMP_AGE)
}

/// Write `data` to a uniquely named temp file in `dir` and rename it over
/// `target`
fn write_through_temp(dir: &Path, prefix: &str, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(target)?;
    Ok(())
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.ensure_ready().await?;
        let name = Self::entry_name(key);

        match fs::read(self.dir.join(&name)).await {
            Ok(data) => {
                self.track_if_untracked(&name, data.len() as u64).await;
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Store hit");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // The file may have been cleared from outside
                if self.entries.read().await.contains_key(&name) {
                    self.remove_entry(&name).await;
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.ensure_ready().await?;
        let name = Self::entry_name(key);
        let size = data.len() as u64;

        self.evict_if_needed(size, &name).await;

        self.write_atomic(&name, data).await?;

        let meta = EntryMeta {
            size,
            written_at: Utc::now(),
        };
        let previous = self.entries.write().await.insert(name, meta);
        if let Some(previous) = previous {
            self.current_size.fetch_sub(previous.size, Ordering::Relaxed);
        }
        self.current_size.fetch_add(size, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);

        debug!(key, size, "Stored blob");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        self.ensure_ready().await?;
        Ok(self.remove_entry(&Self::entry_name(key)).await)
    }

    async fn clear(&self) -> Result<()> {
        self.ensure_ready().await?;

        {
            let mut entries = self.entries.write().await;
            entries.clear();
            self.current_size.store(0, Ordering::Relaxed);
        }

        // Walk the directory itself, which also holds entries written by
        // other stores
        let mut removed = 0usize;
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            if name == VERSION_FILE || name.contains(TMP_MARKER) {
                continue;
            }
            if !item.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(item.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(dir = ?self.dir, removed, "Blob store cleared");
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        let entries = self.entries.read().await;
        StoreStats {
            entries: entries.len(),
            total_size: self.current_size.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
