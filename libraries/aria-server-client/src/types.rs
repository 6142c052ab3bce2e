//! Types for the scrobble endpoint.

use serde::{Deserialize, Serialize};

/// Configuration for a scrobble endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleEndpointConfig {
    /// Base URL of the server (e.g., "https://music.example.com")
    pub url: String,
    /// Bearer token sent with every report (if any)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl ScrobbleEndpointConfig {
    /// Create a config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Create a config with a bearer token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::new(url)
        }
    }
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
