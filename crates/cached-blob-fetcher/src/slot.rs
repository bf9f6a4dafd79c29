//! Per-consumer fetch session
//!
//! A [`BlobSlot`] is what a playback element holds: one logical resource at
//! a time. Every `resolve` takes a new generation token before it starts;
//! when it finishes, its result is committed only if no later `resolve` (or
//! `clear`) has happened since. Results that lose are dropped, which
//! releases their handle.

use crate::fetcher::{CachedBlobFetcher, Origin};
use crate::handle::LocalHandle;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

#[derive(Debug)]
pub enum SlotState {
    Idle,
    Loading {
        key: String,
    },
    Ready {
        key: String,
        handle: LocalHandle,
        origin: Origin,
    },
    Failed {
        key: String,
        message: String,
    },
}

impl SlotState {
    pub fn key(&self) -> Option<&str> {
        match self {
            SlotState::Idle => None,
            SlotState::Loading { key }
            | SlotState::Ready { key, .. }
            | SlotState::Failed { key, .. } => Some(key),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SlotState::Loading { .. })
    }

    pub fn handle(&self) -> Option<&LocalHandle> {
        match self {
            SlotState::Ready { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SlotState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub struct BlobSlot {
    fetcher: Arc<CachedBlobFetcher>,
    generation: AtomicU64,
    state: watch::Sender<SlotState>,
}

impl BlobSlot {
    pub fn new(fetcher: Arc<CachedBlobFetcher>) -> Self {
        let (state, _) = watch::channel(SlotState::Idle);
        Self {
            fetcher,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Current state of the slot
    pub fn state(&self) -> watch::Ref<'_, SlotState> {
        self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SlotState> {
        self.state.subscribe()
    }

    /// Start resolving `key`, superseding anything in flight
    ///
    /// The slot switches to `Loading` and the generation token is taken
    /// when this is called, not when the returned future is first polled.
    /// The future resolves to whether its outcome was committed.
    pub fn resolve(&self, key: &str) -> impl Future<Output = bool> + Send + '_ {
        let key = key.to_string();
        let token = self.begin(&key);

        async move {
            let outcome = match self.fetcher.resolve(&key).await {
                Ok(resolved) => SlotState::Ready {
                    key: key.clone(),
                    handle: resolved.handle,
                    origin: resolved.origin,
                },
                Err(e) => SlotState::Failed {
                    key: key.clone(),
                    message: e.user_message(self.fetcher.messages()),
                },
            };

            let committed = self.commit(token, outcome);
            if !committed {
                warn!(key = %key, token, "Discarded superseded result");
            }
            committed
        }
    }

    /// Tear down: release the current handle and ignore anything in flight
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(SlotState::Idle);
    }

    fn begin(&self, key: &str) -> u64 {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(SlotState::Loading {
            key: key.to_string(),
        });
        token
    }

    fn commit(&self, token: u64, outcome: SlotState) -> bool {
        // Checked under the channel's lock so a concurrent `begin` either
        // lands before the check or overwrites the committed state
        self.state.send_if_modified(move |current| {
            if self.generation.load(Ordering::SeqCst) != token {
                return false;
            }
            *current = outcome;
            true
        })
    }
}

impl Drop for BlobSlot {
    fn drop(&mut self) {
        // Subscribers keep the channel value alive, so release explicitly
        self.clear();
    }
}
