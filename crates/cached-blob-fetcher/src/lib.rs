//! Cached blob fetcher
//!
//! Resolves a resource key (normally a URL serving preview audio) to a
//! [`LocalHandle`] usable by a playback element. The bytes are read from a
//! [`BlobStore`](blob_store::BlobStore) when present and fetched from the
//! network otherwise, then written back for later sessions.
//!
//! [`BlobSlot`] wraps the fetcher for a single consumer: only the most recent
//! `resolve` is ever surfaced and handles from superseded or torn down
//! resolutions are released.

pub mod config;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod handle;
pub mod messages;
pub mod preview;
pub mod slot;
pub mod source;

pub use config::FetcherConfig;
pub use envelope::{classify, Classified};
pub use error::{FetchError, Result};
pub use fetcher::{CachedBlobFetcher, Origin, Resolved};
pub use handle::{HandleRegistry, LocalHandle};
pub use messages::FetchMessages;
pub use preview::preview_audio_url;
pub use slot::{BlobSlot, SlotState};
pub use source::{BlobSource, HttpBlobSource, SourceResponse};
