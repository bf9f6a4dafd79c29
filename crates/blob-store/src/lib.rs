//! Persistent blob store
//!
//! Maps a resource key to the raw bytes fetched for it. Entries are only ever
//! fully overwritten, never merged, so implementations need nothing beyond
//! atomic per-key get and put.
//!
//! Two implementations ship with the crate:
//! - [`FileBlobStore`]: one file per entry under a versioned namespace
//!   directory, created lazily on first use
//! - [`MemoryBlobStore`]: a `HashMap` kept in process, used as a test fake

mod error;
mod file;
mod memory;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use store::BlobStore;
pub use types::{EntryMeta, StoreStats, DEFAULT_NAMESPACE, SCHEMA_VERSION};
