//! Short-lived local references to fetched bytes
//!
//! A [`LocalHandle`] plays the role of an object URL: a string that can be
//! handed to a playback element and dereferenced through the
//! [`HandleRegistry`] that issued it. Dropping the handle revokes the URL.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const URL_PREFIX: &str = "blob:vibematch/";

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, Bytes>>,
}

impl Inner {
    fn live(&self) -> MutexGuard<'_, HashMap<u64, Bytes>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Issues and tracks local handles
#[derive(Clone, Default)]
pub struct HandleRegistry {
    inner: Arc<Inner>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return a handle that keeps it reachable
    pub fn create(&self, data: Bytes) -> LocalHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.live().insert(id, data.clone());
        LocalHandle {
            id,
            url: format!("{}{}", URL_PREFIX, id),
            data,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Dereference a handle URL, if the handle is still alive
    pub fn resolve_url(&self, url: &str) -> Option<Bytes> {
        let id = url.strip_prefix(URL_PREFIX)?.parse::<u64>().ok()?;
        self.inner.live().get(&id).cloned()
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        self.inner.live().len()
    }
}

/// A live reference to resolved bytes, revoked on drop
pub struct LocalHandle {
    id: u64,
    url: String,
    data: Bytes,
    registry: Arc<Inner>,
}

impl LocalHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for LocalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalHandle")
            .field("url", &self.url)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for LocalHandle {
    fn drop(&mut self) {
        self.registry.live().remove(&self.id);
    }
}
