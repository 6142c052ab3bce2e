//! Audio renderer seam
//!
//! The renderer owns decoding and output. It is singly owned by the
//! controller and reports back asynchronously through `drain_events()`.
//! Every load carries a `LoadToken`; events for an older token are stale
//! and get dropped by the controller.

use aria_audio::FilterStage;
use aria_core::TrackId;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(pub u64);

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request to open a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Token echoed back in events
    pub token: LoadToken,
    /// Track being loaded
    pub track_id: TrackId,
    /// Stream locator
    pub url: String,
    /// Duration from the catalog (the renderer may report a more exact one)
    pub expected_duration: Duration,
}

/// Asynchronous renderer notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererEvent {
    /// Track opened and ready
    Loaded {
        /// Load this event belongs to
        token: LoadToken,
        /// Decoded duration
        duration: Duration,
    },
    /// Audio started
    Playing {
        /// Load this event belongs to
        token: LoadToken,
    },
    /// Reached the end of the track
    Ended {
        /// Load this event belongs to
        token: LoadToken,
    },
    /// Decode error, network stall, unsupported format
    Error {
        /// Load this event belongs to
        token: LoadToken,
        /// Description
        message: String,
    },
}

impl RendererEvent {
    /// Load this event belongs to
    pub fn token(&self) -> LoadToken {
        match self {
            RendererEvent::Loaded { token, .. }
            | RendererEvent::Playing { token }
            | RendererEvent::Ended { token }
            | RendererEvent::Error { token, .. } => *token,
        }
    }
}

/// Decoder plus output sink
///
/// All calls are safe in any state; a call that makes no sense (pause with
/// nothing loaded) is ignored.
pub trait AudioRenderer: Send {
    /// Start opening a track, replacing whatever was loaded
    ///
    /// # Errors
    /// Returns an error if the request is rejected outright; asynchronous
    /// failures arrive as `RendererEvent::Error`
    fn load(&mut self, request: LoadRequest) -> Result<()>;

    /// Start or resume output
    fn play(&mut self);

    /// Pause output
    fn pause(&mut self);

    /// Stop and unload
    fn stop(&mut self);

    /// Jump to an absolute position
    fn seek(&mut self, position: Duration);

    /// Output gain (0.0 - 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Unthrottled playback position
    fn position(&self) -> Duration;

    /// Duration of the loaded track, once known
    fn duration(&self) -> Option<Duration>;

    /// Warm up the next track on a secondary path (advisory)
    ///
    /// # Errors
    /// Returns an error if preloading is not possible; playback is unaffected
    fn preload(&mut self, url: &str) -> Result<()>;

    /// Drop any preloaded track
    fn cancel_preload(&mut self);

    /// Swap in a new equalizer stage without touching the source connection
    fn set_filter_stage(&mut self, stage: FilterStage);

    /// Take queued events
    fn drain_events(&mut self) -> Vec<RendererEvent>;
}
