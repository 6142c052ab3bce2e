//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crossfade::CrossfadeSettings;

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl std::str::FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "all" => Ok(Self::All),
            "one" => Ok(Self::One),
            other => Err(format!("unknown repeat mode '{}'", other)),
        }
    }
}

/// Controller state
///
/// `Idle -> Loading -> Playing <-> Paused -> Ended`, with `Loading` and
/// `Playing` able to drop into `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded
    #[default]
    Idle,

    /// Waiting for the renderer to open the current track
    Loading,

    /// Audio is playing
    Playing,

    /// Loaded and paused
    Paused,

    /// Reached the end of the queue
    Ended,

    /// Current track failed to load or play
    Error,
}

/// Shuffle permutation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShuffleStrategy {
    /// Fisher-Yates over the remainder
    #[default]
    Random,

    /// Interleave artists so the same artist rarely plays back to back
    ArtistSpread,
}

/// Persisted repeat/shuffle preferences (`playbackPreferences` key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPreferences {
    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether shuffle is on
    pub shuffle_enabled: bool,
}

/// Playback tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial output volume (0.0 - 1.0)
    pub volume: f32,

    /// Quiet period before a routine queue mutation is written
    pub debounce_delay: Duration,

    /// How often the scrobble scheduler samples progress
    pub scrobble_interval: Duration,

    /// Position after which "now playing" is reported
    pub now_playing_threshold: Duration,

    /// Fraction of the duration after which "played" is reported
    pub completion_ratio: f64,

    /// Fraction of the duration after which the next track is preloaded
    pub preload_ratio: f64,

    /// Crossfade settings
    pub crossfade: CrossfadeSettings,

    /// Minimum spacing of position events to observers
    pub progress_interval: Duration,

    /// "Previous" restarts the track instead when further in than this
    pub restart_threshold: Duration,

    /// Delay before retrying a failed track
    pub retry_delay: Duration,

    /// Retries per track before skipping
    pub max_retries: u32,

    /// Consecutive failed tracks before playback stops
    pub max_consecutive_failures: u32,

    /// Logical player identifier sent with scrobbles
    pub player_name: String,

    /// Shuffle permutation strategy
    pub shuffle_strategy: ShuffleStrategy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            debounce_delay: Duration::from_secs(1),
            scrobble_interval: Duration::from_secs(2),
            now_playing_threshold: Duration::from_secs(10),
            completion_ratio: 0.7,
            preload_ratio: 0.8,
            crossfade: CrossfadeSettings::default(),
            progress_interval: Duration::from_millis(250),
            restart_threshold: Duration::from_secs(3),
            retry_delay: Duration::from_secs(1),
            max_retries: 1,
            max_consecutive_failures: 3,
            player_name: "aria".to_string(),
            shuffle_strategy: ShuffleStrategy::Random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_wire_format() {
        let prefs = PlaybackPreferences {
            repeat_mode: RepeatMode::All,
            shuffle_enabled: true,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        assert_eq!(json, r#"{"repeatMode":"all","shuffleEnabled":true}"#);
    }

    #[test]
    fn repeat_mode_parses_case_insensitively() {
        assert_eq!("ONE".parse::<RepeatMode>(), Ok(RepeatMode::One));
        assert!("sometimes".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = PlaybackConfig::default();
        assert_eq!(config.scrobble_interval, Duration::from_secs(2));
        assert_eq!(config.max_consecutive_failures, 3);
        assert_eq!(config.crossfade.duration, Duration::from_secs(3));
        assert!(config.crossfade.enabled);
    }
}
