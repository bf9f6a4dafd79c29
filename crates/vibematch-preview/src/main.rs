//! VibeMatch Preview - local host for cached track previews
//!
//! Serves preview audio for recommended tracks, fetching each track from the
//! backend once and answering repeat requests from the on-disk store.

mod error;
mod server;
mod types;

use crate::error::{PreviewError, Result};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::PreviewConfig;
use blob_store::FileBlobStore;
use cached_blob_fetcher::{CachedBlobFetcher, FetcherConfig, HttpBlobSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("vibematch_preview=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting VibeMatch preview host...");

    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("API base URL: {}", config.fetcher.api_base_url);
    info!("Cache dir: {:?}", config.fetcher.cache_dir);
    match config.fetcher.max_cache_size {
        Some(max) => info!("Max cache size: {} MB", max / (1024 * 1024)),
        None => info!("Max cache size: unbounded"),
    }

    let fetcher = build_fetcher(&config.fetcher)?;
    let state: SharedState = Arc::new(ServerState::new(
        Arc::new(fetcher),
        config.fetcher.api_base_url.clone(),
    ));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}

fn load_config() -> Result<PreviewConfig> {
    let port = match std::env::var("PORT") {
        Ok(s) => s
            .parse::<u16>()
            .map_err(|_| PreviewError::Config(format!("invalid PORT {:?}", s)))?,
        Err(_) => PreviewConfig::default().port,
    };

    Ok(PreviewConfig {
        port,
        fetcher: FetcherConfig::from_env(),
    })
}

fn build_fetcher(config: &FetcherConfig) -> Result<CachedBlobFetcher> {
    let mut store = FileBlobStore::open(&config.cache_dir);
    if let Some(max) = config.max_cache_size {
        store = store.with_max_size(max);
    }

    let source = match config.fetch_timeout {
        Some(timeout) => HttpBlobSource::with_timeout(timeout)?,
        None => HttpBlobSource::new(),
    };

    Ok(
        CachedBlobFetcher::new(Arc::new(store), Arc::new(source))
            .with_messages(config.messages.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_build_fetcher_applies_messages() {
        let dir = tempdir().unwrap();
        let mut config = FetcherConfig {
            cache_dir: dir.path().to_path_buf(),
            max_cache_size: Some(1024),
            fetch_timeout: Some(Duration::from_secs(5)),
            ..FetcherConfig::default()
        };
        config.messages.transport = "Ошибка сети".to_string();

        let fetcher = build_fetcher(&config).unwrap();
        assert_eq!(fetcher.messages().transport, "Ошибка сети");
        assert_eq!(fetcher.handles().live_count(), 0);
    }
}
