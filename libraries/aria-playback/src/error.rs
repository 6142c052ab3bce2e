//! Error types for playback management

use aria_audio::AudioError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index {index} out of bounds (queue length: {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Queue length at the time of the call
        len: usize,
    },

    /// Rating outside 0..=5
    #[error("Invalid rating: {0}")]
    InvalidRating(u8),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Renderer rejected a request
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Equalizer rejected a change
    #[error(transparent)]
    Equalizer(#[from] AudioError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
