//! Scripted renderer for tests
//!
//! Responds to loads and plays with the events a well-behaved renderer
//! would send, unless told to fail. Tests drive position and end-of-track
//! by hand.

use aria_audio::{EqBand, FilterStage};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::error::{PlaybackError, Result};
use crate::renderer::{AudioRenderer, LoadRequest, LoadToken, RendererEvent};

/// In-memory `AudioRenderer`
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    /// Every load request, in order
    pub loads: Vec<LoadRequest>,
    /// Every preload URL, in order
    pub preloads: Vec<String>,
    /// Generations of every attached filter stage
    pub stage_generations: Vec<u64>,
    /// Band filter count of the last attached stage
    pub last_stage_len: usize,
    /// Bands of the last attached stage
    pub last_stage_bands: Vec<EqBand>,
    /// Last volume set
    pub volume: f32,
    /// Whether output is running
    pub playing: bool,
    /// Number of `stop()` calls
    pub stops: usize,
    /// Seeks, in order
    pub seeks: Vec<Duration>,
    /// URLs whose load fails asynchronously
    pub failing_urls: HashSet<String>,
    /// Make `preload()` fail
    pub fail_preload: bool,
    /// Emit `Loaded`/`Playing` automatically
    pub auto_respond: bool,

    current: Option<LoadRequest>,
    position: Duration,
    duration: Option<Duration>,
    pending: VecDeque<RendererEvent>,
}

impl ScriptedRenderer {
    /// Auto-responding renderer
    pub fn new() -> Self {
        Self {
            auto_respond: true,
            volume: 1.0,
            ..Self::default()
        }
    }

    /// Renderer that only emits what the test pushes
    pub fn manual() -> Self {
        Self {
            volume: 1.0,
            ..Self::default()
        }
    }

    /// Token of the most recent load
    pub fn last_token(&self) -> Option<LoadToken> {
        self.current.as_ref().map(|r| r.token)
    }

    /// Most recent load
    pub fn current(&self) -> Option<&LoadRequest> {
        self.current.as_ref()
    }

    /// Move the playhead
    pub fn set_position(&mut self, position: Duration) {
        self.position = position;
    }

    /// Queue an arbitrary event
    pub fn push_event(&mut self, event: RendererEvent) {
        self.pending.push_back(event);
    }

    /// Report end of the current track
    pub fn finish_track(&mut self) {
        if let Some(token) = self.last_token() {
            self.playing = false;
            self.pending.push_back(RendererEvent::Ended { token });
        }
    }

    /// Report an error on the current track
    pub fn fail_current(&mut self, message: &str) {
        if let Some(token) = self.last_token() {
            self.playing = false;
            self.pending.push_back(RendererEvent::Error {
                token,
                message: message.to_string(),
            });
        }
    }
}

impl AudioRenderer for ScriptedRenderer {
    fn load(&mut self, request: LoadRequest) -> Result<()> {
        if request.url.is_empty() {
            return Err(PlaybackError::Renderer("empty url".to_string()));
        }

        self.loads.push(request.clone());
        self.playing = false;
        self.position = Duration::ZERO;
        self.duration = None;

        if self.auto_respond {
            if self.failing_urls.contains(&request.url) {
                self.pending.push_back(RendererEvent::Error {
                    token: request.token,
                    message: "decode error".to_string(),
                });
            } else {
                self.duration = Some(request.expected_duration);
                self.pending.push_back(RendererEvent::Loaded {
                    token: request.token,
                    duration: request.expected_duration,
                });
            }
        }
        self.current = Some(request);
        Ok(())
    }

    fn play(&mut self) {
        if self.current.is_none() || self.playing {
            return;
        }
        self.playing = true;
        if self.auto_respond {
            if let Some(token) = self.last_token() {
                self.pending.push_back(RendererEvent::Playing { token });
            }
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.playing = false;
        self.current = None;
        self.position = Duration::ZERO;
        self.duration = None;
    }

    fn seek(&mut self, position: Duration) {
        self.seeks.push(position);
        self.position = position;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn preload(&mut self, url: &str) -> Result<()> {
        if self.fail_preload {
            return Err(PlaybackError::Renderer("preload unavailable".to_string()));
        }
        self.preloads.push(url.to_string());
        Ok(())
    }

    fn cancel_preload(&mut self) {}

    fn set_filter_stage(&mut self, stage: FilterStage) {
        self.stage_generations.push(stage.generation());
        self.last_stage_len = stage.len();
        self.last_stage_bands = stage.bands().to_vec();
    }

    fn drain_events(&mut self) -> Vec<RendererEvent> {
        self.pending.drain(..).collect()
    }
}
