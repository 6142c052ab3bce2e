/// Player configuration
use crate::error::{PlayerError, Result};
use aria_playback::PlaybackConfig;
use aria_server_client::ScrobbleEndpointConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub scrobble: ScrobbleSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrobbleSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ScrobbleSettings {
    /// Endpoint config for the scrobble client, if scrobbling is on
    pub fn endpoint(&self) -> Option<ScrobbleEndpointConfig> {
        self.enabled.then(|| ScrobbleEndpointConfig {
            url: self.url.clone(),
            access_token: self.access_token.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

impl PlayerConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `aria.toml` in the working directory is used
    /// when present. Environment variables prefixed with `ARIA_` override file
    /// values; nested keys use a double underscore
    /// (`ARIA_STORAGE__DATABASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = Path::new("aria.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path.to_path_buf()));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ARIA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(PlayerError::Config("database URL is required".to_string()));
        }

        if self.scrobble.enabled && self.scrobble.url.is_empty() {
            return Err(PlayerError::Config(
                "scrobble URL is required when scrobbling is enabled (set ARIA_SCROBBLE__URL)"
                    .to_string(),
            ));
        }

        let playback = &self.playback;
        if !(0.0..=1.0).contains(&playback.volume) {
            return Err(PlayerError::Config(format!(
                "volume must be between 0.0 and 1.0, got {}",
                playback.volume
            )));
        }
        for (name, ratio) in [
            ("completion_ratio", playback.completion_ratio),
            ("preload_ratio", playback.preload_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(PlayerError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if playback.max_consecutive_failures == 0 {
            return Err(PlayerError::Config(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        if playback.progress_interval.is_zero() || playback.scrobble_interval.is_zero() {
            return Err(PlayerError::Config(
                "progress and scrobble intervals must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://./data/aria.db".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for ScrobbleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
