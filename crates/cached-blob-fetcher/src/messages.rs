//! User-facing failure messages

use serde::{Deserialize, Serialize};

pub const DEFAULT_TRANSPORT_MESSAGE: &str = "Network error";
pub const DEFAULT_DOWNLOAD_FAILED_MESSAGE: &str = "Failed to download audio.";

/// Generic messages used when the server gave no message of its own
///
/// Both strings are shown as-is, so hosts may swap in localised text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMessages {
    /// Network failure or error status without a usable body
    pub transport: String,
    /// Error payload that carried no message
    pub download_failed: String,
}

impl Default for FetchMessages {
    fn default() -> Self {
        Self {
            transport: DEFAULT_TRANSPORT_MESSAGE.to_string(),
            download_failed: DEFAULT_DOWNLOAD_FAILED_MESSAGE.to_string(),
        }
    }
}
