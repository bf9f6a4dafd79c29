//! Core types for the preview host

use blob_store::StoreStats;
use cached_blob_fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the preview host
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub port: u16,
    pub fetcher: FetcherConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port: 3011,
            fetcher: FetcherConfig::default(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: StoreStats,
    pub live_handles: usize,
}

/// Error body, the same shape the fetcher decodes from upstream
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query for `/audio`
#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    pub src: String,
}
