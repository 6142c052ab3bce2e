//! Aria Player Library
//!
//! Headless player daemon: line commands in, JSON playback events out, with
//! queue state kept in SQLite and listening history sent to the scrobble
//! endpoint.
//!
//! This library exposes the core components for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod headless;
pub mod service;

// Re-export commonly used types for convenience
pub use commands::{Command, CommandError};
pub use config::{PlayerConfig, ScrobbleSettings, StorageSettings};
pub use error::{PlayerError, Result};
pub use headless::HeadlessRenderer;
pub use service::{PlayerHandle, PlayerRequest, PlayerService, PlayerStatus, DEFAULT_TICK_INTERVAL};
