//! Error types for the preview host

use std::fmt;

#[derive(Debug)]
pub enum PreviewError {
    Fetch(cached_blob_fetcher::FetchError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Fetch(err) => write!(f, "Fetch error: {}", err),
            PreviewError::Io(err) => write!(f, "IO error: {}", err),
            PreviewError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewError::Fetch(err) => Some(err),
            PreviewError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<cached_blob_fetcher::FetchError> for PreviewError {
    fn from(err: cached_blob_fetcher::FetchError) -> Self {
        PreviewError::Fetch(err)
    }
}

impl From<std::io::Error> for PreviewError {
    fn from(err: std::io::Error) -> Self {
        PreviewError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PreviewError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PreviewError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;
