//! Error types for agentdesk-sync

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using agentdesk-sync Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the gateway / HTTP layer
    #[error(transparent)]
    Gateway(#[from] agentdesk_api::Error),

    /// Input rejected before anything was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A send is already outstanding for this conversation
    #[error("A message is already being sent in this conversation")]
    SendInFlight,

    /// The response arrived after it stopped being relevant
    #[error("Response is no longer relevant")]
    Stale,
}

/// Coarse classification used by the UI to decide how to present a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No connectivity or transport error
    NetworkFailure,
    /// Backend answered with an error status or an unreadable body
    ServerRejection,
    /// Discarded silently, never shown
    StaleResponse,
    /// Blocked client-side
    ValidationFailure,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Gateway(e) if e.is_network() => ErrorKind::NetworkFailure,
            Error::Gateway(_) => ErrorKind::ServerRejection,
            Error::Validation(_) | Error::SendInFlight => ErrorKind::ValidationFailure,
            Error::Stale => ErrorKind::StaleResponse,
        }
    }

    /// Whether this error should ever reach the user
    pub fn is_user_visible(&self) -> bool {
        self.kind() != ErrorKind::StaleResponse
    }
}
