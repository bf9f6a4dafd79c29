//! Cache-aside resolution of resource keys to local handles

use crate::envelope::{classify, Classified};
use crate::error::{FetchError, Result};
use crate::handle::{HandleRegistry, LocalHandle};
use crate::messages::FetchMessages;
use crate::source::BlobSource;
use blob_store::BlobStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a resolved payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug)]
pub struct Resolved {
    pub handle: LocalHandle,
    pub origin: Origin,
    /// Upstream content type; only known for network fetches
    pub content_type: Option<String>,
}

/// Resolves keys through a persistent store, fetching only on a miss
///
/// Cheap to share behind an `Arc`; any number of [`BlobSlot`]s may use one
/// fetcher concurrently.
///
/// [`BlobSlot`]: crate::slot::BlobSlot
pub struct CachedBlobFetcher {
    store: Arc<dyn BlobStore>,
    source: Arc<dyn BlobSource>,
    handles: HandleRegistry,
    messages: FetchMessages,
}

impl CachedBlobFetcher {
    pub fn new(store: Arc<dyn BlobStore>, source: Arc<dyn BlobSource>) -> Self {
        Self {
            store,
            source,
            handles: HandleRegistry::new(),
            messages: FetchMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: FetchMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn messages(&self) -> &FetchMessages {
        &self.messages
    }

    /// Resolve `key` to a local handle
    ///
    /// Failed resolutions are never written to the store, so calling again
    /// retries the network. A failed store write does not fail the call.
    pub async fn resolve(&self, key: &str) -> Result<Resolved> {
        if key.is_empty() {
            return Err(FetchError::InvalidKey);
        }

        match self.store.get(key).await {
            Ok(Some(data)) if !data.is_empty() => {
                debug!(key, size = data.len(), "Resolved from store");
                return Ok(Resolved {
                    handle: self.handles.create(data),
                    origin: Origin::Cache,
                    content_type: None,
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(key, error = %e, "Store read failed, fetching instead");
            }
        }

        let response = self.source.fetch(key).await.map_err(|e| {
            warn!(key, error = %e, "Blob fetch failed");
            e
        })?;

        let content_type = response.content_type.clone();
        let data = match classify(response) {
            Classified::Payload(data) => data,
            Classified::Failure(e) => {
                warn!(key, error = %e, "Upstream returned an error instead of a blob");
                return Err(e);
            }
        };

        if data.is_empty() {
            debug!(key, "Empty payload, not storing");
        } else if let Err(e) = self.store.put(key, data.clone()).await {
            warn!(key, error = %e, "Failed to store blob");
            // The blob is still usable for this session
        }

        debug!(key, size = data.len(), "Resolved from network");
        Ok(Resolved {
            handle: self.handles.create(data),
            origin: Origin::Network,
            content_type,
        })
    }
}
