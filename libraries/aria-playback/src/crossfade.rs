//! Crossfade fader
//!
//! Volume-envelope crossfade for a single output: fade the outgoing track to
//! silence over its remaining time, advance, then fade the incoming track
//! back to full level. The fader only computes gains; the controller applies
//! them on top of the user volume.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::time::Duration;
use tokio::time::Instant;

/// Fade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FadeCurve {
    /// Straight line
    #[default]
    Linear,

    /// t^0.5: quick rise, slow finish
    SquareRoot,

    /// Slow start, fast middle, slow end
    SCurve,

    /// Constant perceived loudness
    EqualPower,
}

impl FadeCurve {
    /// Gain at normalized `position` (0.0 - 1.0) of a fade-in or fade-out
    #[inline]
    pub fn calculate_gain(&self, position: f32, fade_out: bool) -> f32 {
        let position = position.clamp(0.0, 1.0);
        let t = if fade_out { 1.0 - position } else { position };

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SquareRoot => t.sqrt(),
            FadeCurve::SCurve => (1.0 - (PI * t).cos()) * 0.5,
            FadeCurve::EqualPower => (t * PI * 0.5).sin(),
        }
    }
}

/// Crossfade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeSettings {
    /// Whether crossfade is enabled
    pub enabled: bool,

    /// Remaining-time threshold that starts the fade (also the fade-in length)
    pub duration: Duration,

    /// Fade curve
    pub curve: FadeCurve,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_secs(3),
            curve: FadeCurve::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    FadingOut { started: Instant, length: Duration },
    AwaitingFadeIn,
    FadingIn { started: Instant, length: Duration },
}

/// Result of advancing the fader
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeTick {
    /// Nothing in progress
    Idle,
    /// Apply this gain
    Gain(f32),
    /// Outgoing track reached silence; advance now
    FadeOutComplete,
    /// Incoming track back at full level
    FadeInComplete,
}

/// Fade state machine
#[derive(Debug, Clone)]
pub struct CrossfadeFader {
    settings: CrossfadeSettings,
    phase: Phase,
}

impl CrossfadeFader {
    /// Create an idle fader
    pub fn new(settings: CrossfadeSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
        }
    }

    /// Current settings
    pub fn settings(&self) -> &CrossfadeSettings {
        &self.settings
    }

    /// Replace settings; cancels any fade in progress
    pub fn set_settings(&mut self, settings: CrossfadeSettings) {
        self.settings = settings;
        self.phase = Phase::Idle;
    }

    /// Whether a fade should start with `remaining` time left
    pub fn should_start(&self, remaining: Duration) -> bool {
        self.settings.enabled
            && self.is_idle()
            && !self.settings.duration.is_zero()
            && !remaining.is_zero()
            && remaining < self.settings.duration
    }

    /// Begin fading out over `remaining`
    pub fn start_fade_out(&mut self, now: Instant, remaining: Duration) {
        self.phase = Phase::FadingOut {
            started: now,
            length: remaining.min(self.settings.duration),
        };
    }

    /// The outgoing track ended before the fade finished
    pub fn finish_fade_out(&mut self) {
        if matches!(self.phase, Phase::FadingOut { .. }) {
            self.phase = Phase::AwaitingFadeIn;
        }
    }

    /// Incoming track started playing
    pub fn begin_fade_in(&mut self, now: Instant) {
        if self.phase == Phase::AwaitingFadeIn {
            self.phase = Phase::FadingIn {
                started: now,
                length: self.settings.duration,
            };
        }
    }

    /// Abort; gain returns to 1.0
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Nothing in progress
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Fading the outgoing track
    pub fn is_fading_out(&self) -> bool {
        matches!(self.phase, Phase::FadingOut { .. })
    }

    /// Waiting for the incoming track to start
    pub fn is_awaiting_fade_in(&self) -> bool {
        self.phase == Phase::AwaitingFadeIn
    }

    /// Gain to apply right now
    pub fn gain(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Idle => 1.0,
            Phase::AwaitingFadeIn => 0.0,
            Phase::FadingOut { started, length } => {
                self.settings.curve.calculate_gain(progress(started, length, now), true)
            }
            Phase::FadingIn { started, length } => {
                self.settings.curve.calculate_gain(progress(started, length, now), false)
            }
        }
    }

    /// Advance to `now`
    pub fn tick(&mut self, now: Instant) -> FadeTick {
        match self.phase {
            Phase::Idle => FadeTick::Idle,
            Phase::AwaitingFadeIn => FadeTick::Gain(0.0),
            Phase::FadingOut { started, length } => {
                if progress(started, length, now) >= 1.0 {
                    self.phase = Phase::AwaitingFadeIn;
                    FadeTick::FadeOutComplete
                } else {
                    FadeTick::Gain(self.gain(now))
                }
            }
            Phase::FadingIn { started, length } => {
                if progress(started, length, now) >= 1.0 {
                    self.phase = Phase::Idle;
                    FadeTick::FadeInComplete
                } else {
                    FadeTick::Gain(self.gain(now))
                }
            }
        }
    }
}

fn progress(started: Instant, length: Duration, now: Instant) -> f32 {
    if length.is_zero() {
        return 1.0;
    }
    (now.saturating_duration_since(started).as_secs_f32() / length.as_secs_f32()).min(1.0)
}
