//! Playback events
//!
//! Queued by the controller and drained by the host, which fans them out to
//! UI and OS "now playing" integrations.

use aria_core::{ScrobbleReport, TrackId};
use serde::Serialize;

use crate::types::PlaybackState;

/// Metadata for system-level "now playing" surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingInfo {
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album name
    pub album: String,
    /// Cover art
    pub artwork_url: Option<String>,
    /// Track length
    pub duration_seconds: f64,
    /// Current position
    pub position_seconds: f64,
    /// Whether audio is playing
    pub playing: bool,
}

/// User-facing recovery notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackNotice {
    /// Reloading a track that failed
    Retrying {
        /// Failing track
        track_id: TrackId,
        /// Retry number (1-based)
        attempt: u32,
    },
    /// Giving up on a track and moving on
    Skipping {
        /// Failing track
        track_id: TrackId,
        /// Failed tracks in a row so far
        consecutive_failures: u32,
    },
    /// Playback stopped after repeated failures
    StoppedAfterErrors {
        /// Failed tracks in a row
        consecutive_failures: u32,
    },
}

impl PlaybackNotice {
    /// Only the terminal notice is fatal
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlaybackNotice::StoppedAfterErrors { .. })
    }
}

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Play state or cursor changed
    #[serde(rename_all = "camelCase")]
    StateChanged {
        /// Whether audio is playing
        playing: bool,
        /// Cursor
        current_index: Option<usize>,
        /// Controller state
        state: PlaybackState,
    },

    /// A different track became current
    #[serde(rename_all = "camelCase")]
    TrackChanged {
        /// New current track
        track_id: TrackId,
        /// Previous current track
        previous_track_id: Option<TrackId>,
        /// Cursor
        index: usize,
    },

    /// Now-playing metadata (track, play-state or position changed)
    NowPlaying(NowPlayingInfo),

    /// Throttled position update
    #[serde(rename_all = "camelCase")]
    PositionChanged {
        /// Position in milliseconds
        position_ms: u64,
        /// Duration in milliseconds
        duration_ms: u64,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// Volume (0.0 - 1.0)
        volume: f32,
        /// Whether output is muted
        muted: bool,
    },

    /// Queue contents, order or cursor changed
    #[serde(rename_all = "camelCase")]
    QueueChanged {
        /// Queue length
        length: usize,
        /// Cursor
        current_index: Option<usize>,
    },

    /// Next track preloaded
    #[serde(rename_all = "camelCase")]
    NextTrackPrepared {
        /// Preloaded track
        track_id: TrackId,
    },

    /// Equalizer gains changed
    EqualizerChanged {
        /// Gains in band order
        gains: Vec<f32>,
    },

    /// A scrobble report is due
    Scrobble(ScrobbleReport),

    /// Recovery notice
    Notice(PlaybackNotice),
}
