//! Error types for lifecycle-manager API operations.

use std::fmt;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (transport failure or non-success status).
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if one was received.
        status: Option<u16>,
    },

    /// The token endpoint rejected the supplied credentials.
    #[error("authentication rejected by the lifecycle manager")]
    AuthFailed,

    /// The API answered, but the payload is unusable.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// No bundle with the given id is known.
    #[error("bundle not found: {0}")]
    BundleNotFound(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create an invalid-response error.
    pub fn invalid(message: impl fmt::Display) -> Self {
        Self::InvalidResponse(message.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_constructor() {
        let err = Error::http("connection reset", Some(502));
        match err {
            Error::Http { message, status } => {
                assert_eq!(message, "connection reset");
                assert_eq!(status, Some(502));
            }
            _ => panic!("Expected Error::Http"),
        }
    }

    #[test]
    fn test_from_status_code() {
        let err: Error = ureq::Error::StatusCode(503).into();
        match err {
            Error::Http { status, .. } => assert_eq!(status, Some(503)),
            _ => panic!("Expected Error::Http"),
        }
    }

    #[test]
    fn test_display() {
        let err = Error::BundleNotFound("bundle-1".to_string());
        assert!(format!("{}", err).contains("bundle-1"));

        let err = Error::AuthFailed;
        assert!(format!("{}", err).contains("authentication"));
    }
}
