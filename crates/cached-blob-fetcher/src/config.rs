//! Fetcher configuration from the environment

use crate::messages::FetchMessages;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_CACHE_DIR: &str = "./cache/audio";

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Backend serving preview audio
    pub api_base_url: String,
    /// Root directory of the persistent store
    pub cache_dir: PathBuf,
    /// Store size bound in bytes; `None` keeps everything
    pub max_cache_size: Option<u64>,
    /// Request timeout; `None` waits until superseded
    pub fetch_timeout: Option<Duration>,
    pub messages: FetchMessages,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_cache_size: None,
            fetch_timeout: None,
            messages: FetchMessages::default(),
        }
    }
}

impl FetcherConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.api_base_url);

        let cache_dir = lookup("AUDIO_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let max_cache_size = lookup("AUDIO_CACHE_MAX_SIZE").and_then(|s| s.parse::<u64>().ok());

        let fetch_timeout = lookup("FETCH_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let messages = FetchMessages {
            transport: lookup("MSG_TRANSPORT_ERROR").unwrap_or(defaults.messages.transport),
            download_failed: lookup("MSG_DOWNLOAD_FAILED")
                .unwrap_or(defaults.messages.download_failed),
        };

        Self {
            api_base_url,
            cache_dir,
            max_cache_size,
            fetch_timeout,
            messages,
        }
    }
}
