//! Aria Server Client
//!
//! HTTP client for reporting listening history to an Aria-compatible server.
//!
//! # Features
//!
//! - **Scrobbling**: "now playing" and "played" reports, one POST each
//! - **Auth**: optional bearer token
//! - **Seam**: implements `aria_core::ScrobbleSink`
//!
//! # Example
//!
//! ```ignore
//! use aria_core::ScrobbleSink;
//! use aria_server_client::{ScrobbleClient, ScrobbleEndpointConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrobbleEndpointConfig::with_token("https://music.example.com", "token");
//!     let client = ScrobbleClient::new(config)?;
//!
//!     // Reports come out of the playback controller as events
//!     client.submit(&report).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

// Re-export main types
pub use client::{ScrobbleClient, SCROBBLE_PATH};
pub use error::{Result, ServerClientError};
pub use types::ScrobbleEndpointConfig;
