//! Decide whether a response carries a blob or an error
//!
//! Servers are expected to use error statuses, but some endpoints answer
//! `200` with a JSON error object. Anything declared as JSON is therefore
//! decoded as an [`ErrorEnvelope`] and never treated as a payload.

use crate::error::FetchError;
use crate::source::SourceResponse;
use bytes::Bytes;
use serde::Deserialize;

/// Error object of the form `{"error": "..."}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// The message, when `error` is a non-empty string
    fn message(self) -> Option<String> {
        match self.error {
            Some(serde_json::Value::String(msg)) if !msg.trim().is_empty() => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Classified {
    Payload(Bytes),
    Failure(FetchError),
}

/// Whether a content type declares structured data rather than a blob
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn envelope_message(response: &SourceResponse) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(ErrorEnvelope::message)
}

pub fn classify(response: SourceResponse) -> Classified {
    let is_json = response
        .content_type
        .as_deref()
        .map(is_json_content_type)
        .unwrap_or(false);

    if !response.is_success() {
        let message = if is_json {
            envelope_message(&response)
        } else {
            None
        };
        return Classified::Failure(FetchError::Status {
            status: response.status,
            message,
        });
    }

    if is_json {
        return Classified::Failure(FetchError::Structured(envelope_message(&response)));
    }

    Classified::Payload(response.body)
}
