//! Error types for agentdesk-api

use thiserror::Error;

/// Result type alias using agentdesk-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The configured base URL cannot be used
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a rejected request, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the request never produced a usable response (connectivity,
    /// timeouts, broken bodies).
    pub fn is_network(&self) -> bool {
        match self {
            Error::Http(e) => e.status().is_none() && !e.is_decode(),
            _ => false,
        }
    }

    /// Check if this error is worth retrying for an idempotent request
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_rate_limit() {
        assert!(Error::api(429, "Too many requests").is_retryable());
    }

    #[test]
    fn test_retryable_server_errors() {
        assert!(Error::api(500, "internal").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
    }

    #[test]
    fn test_not_retryable_client_errors() {
        assert!(!Error::api(400, "Message is required").is_retryable());
        assert!(!Error::api(404, "Agent with ID '9' not found").is_retryable());
        assert!(!Error::InvalidUrl("nope".into()).is_retryable());
    }

    #[test]
    fn test_api_error_is_not_network() {
        let e = Error::api(502, "bad gateway");
        assert!(!e.is_network());
        assert_eq!(e.status(), Some(502));
    }

    #[test]
    fn test_json_error_is_not_network() {
        let e: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!e.is_network());
        assert_eq!(e.status(), None);
    }
}
