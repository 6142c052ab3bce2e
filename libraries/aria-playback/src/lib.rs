//! Aria - Playback
//!
//! Platform-agnostic playback logic for the Aria player.
//!
//! This crate provides:
//! - Playback queue with cursor, shuffle (Random + ArtistSpread), repeat and
//!   single-step undo
//! - Debounced/immediate queue persistence scheduling
//! - Playback controller state machine (load, play, pause, seek, skip)
//! - Scrobble scheduling ("now playing" and "played" reports)
//! - Error recovery (retry, skip, stop)
//! - Next-track preloading and volume-envelope crossfade
//! - Equalizer filter stage hand-off to the renderer
//!
//! # Architecture
//!
//! `aria-playback` does no I/O:
//! - No audio decoding or output (the host provides an `AudioRenderer`)
//! - No dependency on aria-storage (the host writes `QueueSnapshot`s)
//! - No network access (scrobble reports are handed to the host as events)
//!
//! The host owns a `PlaybackController`, calls `tick()` on a short interval
//! and forwards the drained `PlaybackEvent`s.
//!
//! # Example: Queue
//!
//! ```rust
//! use aria_core::{AlbumRef, ArtistRef, Track};
//! use aria_playback::{QueueManager, RepeatMode};
//!
//! let track = |id: &str| {
//!     Track::new(id, id, ArtistRef::new("a1", "Artist"), AlbumRef::new("b1", "Album"), 180_000)
//! };
//!
//! let mut queue = QueueManager::default();
//! queue.replace_all(vec![track("t1"), track("t2"), track("t3")]);
//! queue.set_repeat_mode(RepeatMode::All);
//!
//! queue.remove_at(1).unwrap();
//! assert_eq!(queue.len(), 2);
//!
//! assert!(queue.undo());
//! assert_eq!(queue.len(), 3);
//! assert_eq!(queue.current_index(), Some(0));
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use aria_audio::FilterStage;
//! use aria_playback::{
//!     AudioRenderer, LoadRequest, PlaybackConfig, PlaybackController, RendererEvent, Result,
//! };
//! use std::time::Duration;
//!
//! // Implement AudioRenderer for your platform
//! struct MyRenderer {
//!     events: Vec<RendererEvent>,
//! }
//!
//! impl AudioRenderer for MyRenderer {
//!     fn load(&mut self, request: LoadRequest) -> Result<()> {
//!         // Open the stream, report back asynchronously
//!         self.events.push(RendererEvent::Loaded {
//!             token: request.token,
//!             duration: request.expected_duration,
//!         });
//!         Ok(())
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek(&mut self, _position: Duration) {}
//!     fn set_volume(&mut self, _volume: f32) {}
//!     fn position(&self) -> Duration {
//!         Duration::ZERO
//!     }
//!     fn duration(&self) -> Option<Duration> {
//!         None
//!     }
//!     fn preload(&mut self, _url: &str) -> Result<()> {
//!         Ok(())
//!     }
//!     fn cancel_preload(&mut self) {}
//!     fn set_filter_stage(&mut self, _stage: FilterStage) {}
//!     fn drain_events(&mut self) -> Vec<RendererEvent> {
//!         std::mem::take(&mut self.events)
//!     }
//! }
//!
//! let mut controller =
//!     PlaybackController::new(MyRenderer { events: Vec::new() }, PlaybackConfig::default());
//!
//! // In the host loop
//! controller.poll();
//! for event in controller.drain_events() {
//!     println!("{:?}", event);
//! }
//! ```

mod controller;
mod crossfade;
mod error;
pub mod events;
mod persistence;
mod queue;
mod recovery;
mod renderer;
mod scrobble;
mod shuffle;
mod throttle;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Public exports
pub use controller::{PlaybackController, SessionState};
pub use crossfade::{CrossfadeFader, CrossfadeSettings, FadeCurve, FadeTick};
pub use error::{PlaybackError, Result};
pub use events::{NowPlayingInfo, PlaybackEvent, PlaybackNotice};
pub use persistence::{PersistedQueue, PersistenceScheduler, QueueSnapshot, WriteMode};
pub use queue::{InstanceId, QueueManager, UndoRecord};
pub use recovery::{ErrorRecoveryPolicy, RecoveryAction};
pub use renderer::{AudioRenderer, LoadRequest, LoadToken, RendererEvent};
pub use scrobble::ScrobbleScheduler;
pub use shuffle::shuffle_items;
pub use throttle::ProgressThrottle;
pub use types::{
    PlaybackConfig, PlaybackPreferences, PlaybackState, RepeatMode, ShuffleStrategy,
};
