//! Error types for the blob store

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Io(Box<std::io::Error>),
    /// The namespace on disk was written with a different schema version
    SchemaVersion { found: String, expected: u32 },
    /// Write rejected by a store that was told to fail (test fakes)
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "IO error: {}", err),
            StoreError::SchemaVersion { found, expected } => write!(
                f,
                "Unsupported store schema version {:?} (expected {})",
                found, expected
            ),
            StoreError::Rejected(msg) => write!(f, "Write rejected: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
