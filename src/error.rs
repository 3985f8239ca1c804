//! Error types for fanfold
//!
//! Two failure classes flow through the library:
//! - [`Error`] is fatal for a run. It is returned before any fan-out starts (listing
//!   fetch failed, invalid configuration) and aborts the whole aggregation.
//! - [`FetchError`] is partial. It describes one failed sub-resource fetch, is recorded
//!   under the parent's id in the aggregate result, and never stops other fetches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ParentId;

/// Result type alias for fanfold operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error type for fanfold
///
/// Any of these aborts the current run. Per-record fetch failures are never reported
/// through this type; see [`FetchError`].
#[derive(Debug, Error)]
pub enum Error {
    /// The parent listing could not be fetched or decoded
    #[error("parent listing failed: {message}")]
    Listing {
        /// Human-readable description of the failure
        message: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "source.base_url")
        key: Option<String>,
    },

    /// The server answered with a non-success HTTP status
    #[error("{url} returned HTTP status {status}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The HTTP status code received
        status: u16,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A URL could not be built from the configured base URL and paths
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The completion tracker was used out of order (e.g. registering after it fired)
    #[error("completion tracker error: {0}")]
    Completion(String),
}

impl Error {
    /// Build a [`Error::Listing`] from any displayable cause.
    pub fn listing(cause: impl std::fmt::Display) -> Self {
        Error::Listing {
            message: cause.to_string(),
        }
    }

    /// Build a [`Error::Config`] for the given key.
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single sub-resource fetch.
///
/// Opaque to the fan-out layer: it carries the identity of the parent whose fetch
/// failed and a message, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("fetch for parent {parent_id} failed: {message}")]
pub struct FetchError {
    /// The parent whose sub-resource fetch failed
    pub parent_id: ParentId,
    /// Human-readable cause
    pub message: String,
}

impl FetchError {
    /// Create a fetch error for `parent_id`.
    pub fn new(parent_id: ParentId, message: impl Into<String>) -> Self {
        Self {
            parent_id,
            message: message.into(),
        }
    }

    /// Wrap any error as a fetch failure for `parent_id`.
    pub fn from_error(parent_id: ParentId, err: &dyn std::error::Error) -> Self {
        Self::new(parent_id, err.to_string())
    }

    /// Fetch failure for a task whose fetcher panicked.
    pub fn panicked(parent_id: ParentId, payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new(parent_id, format!("fetch task panicked: {}", detail))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_names_the_parent() {
        let err = FetchError::new(ParentId(7), "connection reset");
        assert_eq!(err.to_string(), "fetch for parent 7 failed: connection reset");
    }

    #[test]
    fn fetch_error_from_error_keeps_the_cause_message() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = FetchError::from_error(ParentId(3), &io);
        assert_eq!(err.parent_id, ParentId(3));
        assert_eq!(err.message, "timed out");
    }

    #[test]
    fn panicked_extracts_str_and_string_payloads() {
        let str_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = FetchError::panicked(ParentId(1), str_payload.as_ref());
        assert_eq!(err.message, "fetch task panicked: boom");

        let string_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));
        let err = FetchError::panicked(ParentId(2), string_payload.as_ref());
        assert_eq!(err.message, "fetch task panicked: kaboom");

        let other_payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        let err = FetchError::panicked(ParentId(3), other_payload.as_ref());
        assert_eq!(err.message, "fetch task panicked: unknown panic payload");
    }

    #[test]
    fn fetch_error_serializes_parent_id_transparently() {
        let err = FetchError::new(ParentId(9), "404 Not Found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["parent_id"], 9);
        assert_eq!(json["message"], "404 Not Found");
    }

    #[test]
    fn config_helper_records_the_key() {
        match Error::config("source.base_url", "must not be empty") {
            Error::Config { message, key } => {
                assert_eq!(message, "must not be empty");
                assert_eq!(key.as_deref(), Some("source.base_url"));
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn listing_error_is_displayed_as_fatal() {
        let err = Error::listing("HTTP status 500");
        assert_eq!(err.to_string(), "parent listing failed: HTTP status 500");
    }
}
