//! Error types for chalkboard-core

use thiserror::Error;

/// Main error type for the chalkboard-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Network or non-2xx HTTP failure from the backend API
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status code, when the request got far enough to have one
        status: Option<u16>,
        message: String,
    },

    /// Resource has vanished from the backend (deleted session, etc.)
    ///
    /// Unlike [`Error::Transport`], this is fatal to the view observing
    /// the resource: pollers stop and consumers navigate away.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input rejected before any network call (blank or over-length question)
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a transport error from an HTTP status and response body
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            status,
            message: message.into(),
        }
    }

    /// True for the fatal-to-view not-found case
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for chalkboard-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_carries_status() {
        let err = Error::transport(Some(502), "bad gateway");
        match err {
            Error::Transport { status, .. } => assert_eq!(status, Some(502)),
            _ => panic!("expected transport error"),
        }
    }

    #[test]
    fn test_not_found_detection() {
        assert!(Error::NotFound("session abc".to_string()).is_not_found());
        assert!(!Error::transport(Some(500), "boom").is_not_found());
        assert!(!Error::Validation("empty".to_string()).is_not_found());
    }
}
