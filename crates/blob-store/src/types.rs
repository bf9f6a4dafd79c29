//! Store types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespace used for cached preview audio
pub const DEFAULT_NAMESPACE: &str = "audio-files";

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// In-memory metadata for a stored entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    pub size: u64,
    pub written_at: DateTime<Utc>,
}

/// Statistics about the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}
