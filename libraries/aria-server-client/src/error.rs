//! Error types for the scrobble client.

use aria_core::AriaError;
use thiserror::Error;

/// Errors that can occur when reporting to a scrobble endpoint.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Endpoint rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Rate limited by server
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

impl From<ServerClientError> for AriaError {
    fn from(err: ServerClientError) -> Self {
        match err {
            ServerClientError::InvalidUrl(msg) => AriaError::invalid_input(msg),
            other => AriaError::network(other.to_string()),
        }
    }
}

/// Result type for scrobble client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
