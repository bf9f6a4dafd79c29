//! Error types for the cached blob fetcher

use crate::messages::FetchMessages;
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    /// The resource key was empty
    InvalidKey,
    /// The request never produced a response (connect, TLS, body read)
    Http(Box<reqwest::Error>),
    /// Non-success status, with the server's error message when it sent one
    Status { status: u16, message: Option<String> },
    /// Success status but the body was an error object instead of a blob
    Structured(Option<String>),
}

impl FetchError {
    /// The string shown to the user for this failure
    pub fn user_message(&self, messages: &FetchMessages) -> String {
        match self {
            FetchError::Status {
                message: Some(msg), ..
            } => msg.clone(),
            FetchError::Http(_) | FetchError::Status { message: None, .. } => {
                messages.transport.clone()
            }
            FetchError::Structured(Some(msg)) => msg.clone(),
            FetchError::Structured(None) | FetchError::InvalidKey => {
                messages.download_failed.clone()
            }
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidKey => write!(f, "Resource key is empty"),
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::Status { status, message } => match message {
                Some(msg) => write!(f, "Upstream returned status {}: {}", status, msg),
                None => write!(f, "Upstream returned status {}", status),
            },
            FetchError::Structured(Some(msg)) => write!(f, "Upstream error payload: {}", msg),
            FetchError::Structured(None) => write!(f, "Upstream error payload without message"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_with_message_surfaces_it() {
        let err = FetchError::Status {
            status: 429,
            message: Some("quota exceeded".to_string()),
        };
        assert_eq!(err.user_message(&FetchMessages::default()), "quota exceeded");
        assert_eq!(
            format!("{}", err),
            "Upstream returned status 429: quota exceeded"
        );
    }

    #[test]
    fn test_status_without_message_uses_transport_fallback() {
        let err = FetchError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(&FetchMessages::default()), "Network error");
    }

    #[test]
    fn test_structured_fallback() {
        let messages = FetchMessages::default();
        assert_eq!(
            FetchError::Structured(Some("not found".to_string())).user_message(&messages),
            "not found"
        );
        assert_eq!(
            FetchError::Structured(None).user_message(&messages),
            "Failed to download audio."
        );
    }

    #[test]
    fn test_error_is_debug() {
        let err = FetchError::InvalidKey;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("InvalidKey"));
    }
}
