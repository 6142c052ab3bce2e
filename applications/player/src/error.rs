/// Player error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] aria_storage::StorageError),

    #[error(transparent)]
    Core(#[from] aria_core::AriaError),

    #[error("Playback error: {0}")]
    Playback(#[from] aria_playback::PlaybackError),

    #[error("Scrobble client error: {0}")]
    ServerClient(#[from] aria_server_client::ServerClientError),

    #[error("Invalid command: {0}")]
    Command(#[from] crate::commands::CommandError),

    #[error("Player service is not running")]
    ServiceStopped,
}
