//! Error types for the todo client.
//!
//! # Design
//! `TransportError` is kept apart from `ApiError` because the router routes
//! on it: a request that never produced a response may be retried against the
//! secondary endpoint, while a response with a bad status never is.
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the task does not exist" from "the server returned an unexpected status."

use std::fmt;

use thiserror::Error;

/// Why a request could not complete at the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Dns,
    Timeout,
    Io,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Io => "io",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

/// A request that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure for {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by `Outcome::into_result`, `TaskClient` parse methods and
/// `TodoApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status other than the one expected.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// Neither endpoint produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Rejected locally before any request was issued.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 404 {
            ApiError::NotFound
        } else {
            ApiError::HttpError { status, body }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_names_kind_and_url() {
        let err = TransportError::new(
            TransportErrorKind::Connect,
            "http://localhost:5001/tasks",
            "connection refused",
        );
        assert_eq!(
            err.to_string(),
            "connect failure for http://localhost:5001/tasks: connection refused"
        );
    }

    #[test]
    fn from_status_maps_404_to_not_found() {
        assert!(matches!(ApiError::from_status(404, String::new()), ApiError::NotFound));
        assert!(matches!(
            ApiError::from_status(500, "boom".to_string()),
            ApiError::HttpError { status: 500, .. }
        ));
    }

    #[test]
    fn transport_error_converts_into_api_error() {
        let err: ApiError =
            TransportError::new(TransportErrorKind::Timeout, "http://x/tasks", "timed out").into();
        assert!(matches!(err, ApiError::Transport(ref e) if e.kind == TransportErrorKind::Timeout));
    }
}
