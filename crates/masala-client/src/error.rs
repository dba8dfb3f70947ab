//! # Client Error Types
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outcome                               ClientError        Retry?        │
//! │  ───────────────────────────────────   ───────────────    ──────        │
//! │  connect refused, DNS, TLS, timeout    Transient          safe          │
//! │  HTTP 5xx, 408, 429                    Transient          safe          │
//! │  HTTP 4xx (other)                      Rejected           fix input     │
//! │  HTTP 2xx with unreadable body         InvalidResponse    may duplicate │
//! │  bad base URL, client build failure    InvalidConfig      no            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Client error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request may not have reached the server, or the server failed
    /// in a way a retry can fix.
    #[error("Temporary failure: {message}")]
    Transient { message: String },

    /// The server understood the request and refused it.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server answered 2xx but the body was not what we expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client setup is wrong (bad base URL, TLS backend missing).
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Returns true if retrying the same request is safe and may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient { .. })
    }

    pub(crate) fn transient(message: impl Into<String>) -> Self {
        ClientError::Transient {
            message: message.into(),
        }
    }

    /// Maps a transport-level reqwest error (no HTTP status available).
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return ClientError::InvalidConfig(err.to_string());
        }
        if err.is_timeout() {
            return ClientError::transient(format!("request timed out: {err}"));
        }
        if err.is_connect() {
            return ClientError::transient(format!("could not reach server: {err}"));
        }
        ClientError::transient(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(ClientError::transient("timeout").is_transient());
        assert!(!ClientError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!ClientError::InvalidResponse("eof".into()).is_transient());
        assert!(!ClientError::InvalidConfig("url".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = ClientError::Rejected {
            status: 422,
            message: "customerPhone is invalid".into(),
        };
        assert_eq!(err.to_string(), "Rejected (422): customerPhone is invalid");
    }
}
