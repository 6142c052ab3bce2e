//! Wall-clock renderer
//!
//! Plays nothing; the playhead advances with the clock. Used for remote
//! control and automation where no audio device exists, and in end-to-end
//! tests (the clock is tokio's, so paused-time tests drive it).

use aria_audio::FilterStage;
use aria_playback::{AudioRenderer, LoadRequest, PlaybackError, RendererEvent, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

const SUPPORTED_SCHEMES: [&str; 3] = ["http://", "https://", "file://"];

/// `AudioRenderer` without an output device
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    current: Option<LoadRequest>,
    duration: Option<Duration>,
    started_at: Option<Instant>,
    offset: Duration,
    ended: bool,
    volume: f32,
    preloaded: Option<String>,
    stage: Option<FilterStage>,
    pending: Vec<RendererEvent>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            ..Self::default()
        }
    }

    /// Last volume applied
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// URL of the warmed-up next track
    pub fn preloaded(&self) -> Option<&str> {
        self.preloaded.as_deref()
    }

    /// Generation of the attached filter stage
    pub fn stage_generation(&self) -> Option<u64> {
        self.stage.as_ref().map(FilterStage::generation)
    }

    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn clamp(&self, position: Duration) -> Duration {
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

impl AudioRenderer for HeadlessRenderer {
    fn load(&mut self, request: LoadRequest) -> Result<()> {
        if !SUPPORTED_SCHEMES.iter().any(|s| request.url.starts_with(s)) {
            return Err(PlaybackError::Renderer(format!(
                "unsupported stream URL: {}",
                request.url
            )));
        }

        debug!(token = %request.token, url = %request.url, "Headless load");
        self.started_at = None;
        self.offset = Duration::ZERO;
        self.ended = false;
        self.duration = Some(request.expected_duration);
        self.pending.push(RendererEvent::Loaded {
            token: request.token,
            duration: request.expected_duration,
        });
        if self.preloaded.as_deref() == Some(request.url.as_str()) {
            self.preloaded = None;
        }
        self.current = Some(request);
        Ok(())
    }

    fn play(&mut self) {
        let Some(token) = self.current.as_ref().map(|r| r.token) else {
            return;
        };
        if self.started_at.is_none() && !self.ended {
            self.started_at = Some(Instant::now());
            self.pending.push(RendererEvent::Playing { token });
        }
    }

    fn pause(&mut self) {
        if self.started_at.is_some() {
            self.offset = self.position();
            self.started_at = None;
        }
    }

    fn stop(&mut self) {
        self.current = None;
        self.duration = None;
        self.started_at = None;
        self.offset = Duration::ZERO;
        self.ended = false;
    }

    fn seek(&mut self, position: Duration) {
        self.offset = self.clamp(position);
        self.ended = false;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position(&self) -> Duration {
        let elapsed = self
            .started_at
            .map(|start| Instant::now().saturating_duration_since(start))
            .unwrap_or_default();
        self.clamp(self.offset + elapsed)
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn preload(&mut self, url: &str) -> Result<()> {
        if !SUPPORTED_SCHEMES.iter().any(|s| url.starts_with(s)) {
            return Err(PlaybackError::Renderer(format!("cannot preload {}", url)));
        }
        self.preloaded = Some(url.to_string());
        Ok(())
    }

    fn cancel_preload(&mut self) {
        self.preloaded = None;
    }

    fn set_filter_stage(&mut self, stage: FilterStage) {
        trace!(generation = stage.generation(), bands = stage.len(), "Filter stage attached");
        self.stage = Some(stage);
    }

    fn drain_events(&mut self) -> Vec<RendererEvent> {
        if let (Some(token), Some(duration)) = (self.current.as_ref().map(|r| r.token), self.duration) {
            if self.started_at.is_some() && !self.ended && self.position() >= duration {
                self.offset = duration;
                self.started_at = None;
                self.ended = true;
                self.pending.push(RendererEvent::Ended { token });
            }
        }
        std::mem::take(&mut self.pending)
    }
}
