//! Playback controller
//!
//! Owns the queue, the renderer, the equalizer and every timer-driven side
//! effect (scrobble checks, preloading, crossfade, retry delays). The host
//! calls `tick()` on a short interval and drains events afterwards; handlers
//! always re-read current state, so a check that fires after the track moved
//! on acts on the new track.

use aria_audio::{EqualizerGraph, EqualizerSettings};
use aria_core::{Track, TrackId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::crossfade::{CrossfadeFader, CrossfadeSettings, FadeTick};
use crate::error::Result;
use crate::events::{NowPlayingInfo, PlaybackEvent, PlaybackNotice};
use crate::persistence::{PersistedQueue, QueueSnapshot};
use crate::queue::{InstanceId, QueueManager};
use crate::recovery::{ErrorRecoveryPolicy, RecoveryAction};
use crate::renderer::{AudioRenderer, LoadRequest, LoadToken, RendererEvent};
use crate::scrobble::ScrobbleScheduler;
use crate::throttle::ProgressThrottle;
use crate::types::{PlaybackConfig, PlaybackPreferences, PlaybackState, RepeatMode};

const MAX_EVENT_ROUNDS: usize = 8;

/// Session state (not persisted)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    /// Whether audio is playing
    pub playing: bool,
    /// Unthrottled position
    pub position: Duration,
    /// Duration of the current track
    pub duration: Duration,
    /// User volume (0.0 - 1.0)
    pub volume: f32,
    /// Whether output is muted
    pub muted: bool,
    /// Failed tracks in a row
    pub consecutive_failures: u32,
    /// Retries spent on the current track
    pub retry_count: u32,
    /// Whether the next track is warmed up
    pub next_track_preloaded: bool,
}

#[derive(Debug, Clone)]
struct ActiveTrack {
    token: LoadToken,
    track_id: TrackId,
    autoplay: bool,
    loaded: bool,
    duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadReason {
    /// A different entry became current
    TrackChange,
    /// Same entry, new playthrough (repeat-one, replay after end)
    Replay,
    /// Same entry, same playthrough (error recovery)
    Retry,
}

/// Drives an `AudioRenderer` through the queue
pub struct PlaybackController<R: AudioRenderer> {
    config: PlaybackConfig,
    renderer: R,
    queue: QueueManager,
    equalizer: EqualizerGraph,
    scrobbler: ScrobbleScheduler,
    recovery: ErrorRecoveryPolicy,
    fader: CrossfadeFader,
    throttle: ProgressThrottle,

    state: PlaybackState,
    volume: f32,
    muted: bool,
    next_token: u64,
    active: Option<ActiveTrack>,
    next_track_preloaded: bool,
    preload_attempted: bool,
    pending_retry: Option<Instant>,

    pending_events: Vec<PlaybackEvent>,
}

impl<R: AudioRenderer> PlaybackController<R> {
    /// Create a controller with a flat equalizer
    pub fn new(renderer: R, config: PlaybackConfig) -> Self {
        Self::with_equalizer(renderer, config, EqualizerSettings::default())
    }

    /// Create a controller with persisted equalizer settings
    pub fn with_equalizer(renderer: R, config: PlaybackConfig, settings: EqualizerSettings) -> Self {
        let mut controller = Self {
            queue: QueueManager::new(config.debounce_delay, config.shuffle_strategy),
            equalizer: EqualizerGraph::with_settings(settings),
            scrobbler: ScrobbleScheduler::new(
                config.scrobble_interval,
                config.now_playing_threshold,
                config.completion_ratio,
                config.player_name.clone(),
            ),
            recovery: ErrorRecoveryPolicy::new(
                config.max_retries,
                config.max_consecutive_failures,
                config.retry_delay,
            ),
            fader: CrossfadeFader::new(config.crossfade.clone()),
            throttle: ProgressThrottle::new(config.progress_interval),
            state: PlaybackState::Idle,
            volume: config.volume.clamp(0.0, 1.0),
            muted: false,
            next_token: 0,
            active: None,
            next_track_preloaded: false,
            preload_attempted: false,
            pending_retry: None,
            pending_events: Vec::new(),
            renderer,
            config,
        };

        controller.apply_volume(Instant::now());
        controller.rebuild_equalizer(false);
        controller
    }

    /// Restore the persisted queue and preferences; the current track is
    /// loaded but not started
    pub fn hydrate(&mut self, queue: PersistedQueue, preferences: PlaybackPreferences) {
        self.queue.hydrate(queue, preferences);
        self.active = None;
        self.emit_queue_changed();

        if self.queue.current().is_some() {
            self.load_current(LoadReason::TrackChange, false);
        }
    }

    // ===== Event loop =====

    /// Advance timers and process renderer events
    pub fn tick(&mut self, now: Instant) {
        self.process_renderer_events(now);

        if let Some(due) = self.pending_retry {
            if due <= now {
                self.pending_retry = None;
                info!(track_id = ?self.active.as_ref().map(|a| &a.track_id), "Retrying track");
                self.load_current(LoadReason::Retry, true);
            }
        }

        if self.is_loaded() && matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            let position = self.renderer.position();
            let duration = self.current_duration();

            for report in self.scrobbler.tick(now, position, duration) {
                self.pending_events.push(PlaybackEvent::Scrobble(report));
            }

            if self.state == PlaybackState::Playing {
                self.maybe_preload(position, duration);
                self.maybe_start_crossfade(now, position, duration);

                if self.throttle.should_emit(now) {
                    self.emit_position(position, duration);
                }
            }
        }

        self.advance_fader(now);
    }

    /// `tick()` at the current time
    pub fn poll(&mut self) {
        self.tick(Instant::now());
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Transport =====

    /// Start or resume playback
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Playing => {}
            PlaybackState::Loading => {
                if let Some(active) = self.active.as_mut() {
                    active.autoplay = true;
                }
            }
            PlaybackState::Paused if self.is_loaded() => {
                self.renderer.play();
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Paused | PlaybackState::Idle => {
                if !self.queue.is_empty() {
                    self.load_current(LoadReason::TrackChange, true);
                }
            }
            PlaybackState::Ended | PlaybackState::Error => {
                if !self.queue.is_empty() {
                    self.recovery.reset();
                    self.load_current(LoadReason::Replay, true);
                }
            }
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.renderer.pause();
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Loading => {
                if let Some(active) = self.active.as_mut() {
                    active.autoplay = false;
                }
            }
            _ => {}
        }
    }

    /// Pause if playing, otherwise play
    pub fn toggle_play(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop and unload; the queue and cursor stay
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle && self.active.is_none() {
            return;
        }
        self.unload();
    }

    /// Skip to the next track (no-op at the end with repeat off)
    pub fn skip_next(&mut self) {
        let Some(next) = self.queue.next_index() else {
            debug!("No next track");
            return;
        };
        let autoplay = self.wants_playback();
        self.move_cursor(next, autoplay);
    }

    /// Restart the track when past the restart threshold, else go back one
    pub fn skip_previous(&mut self) {
        if self.is_loaded() && self.position() > self.config.restart_threshold {
            self.seek_to(Duration::ZERO);
            return;
        }

        match self.queue.previous_index() {
            Some(previous) => {
                let autoplay = self.wants_playback();
                self.move_cursor(previous, autoplay);
            }
            None => {
                if self.is_loaded() {
                    self.seek_to(Duration::ZERO);
                }
            }
        }
    }

    /// Seek to an absolute position (clamped to the track)
    pub fn seek_to(&mut self, position: Duration) {
        let Some(active) = self.active.as_ref().filter(|a| a.loaded) else {
            return;
        };
        let target = if active.duration.is_zero() {
            position
        } else {
            position.min(active.duration)
        };

        if self.fader.is_fading_out() {
            self.fader.cancel();
            self.apply_volume(Instant::now());
        }

        self.renderer.seek(target);
        self.throttle.reset();
        self.emit_position(target, self.current_duration());
    }

    /// Seek relative to the current position (seconds, may be negative)
    pub fn seek_by(&mut self, offset_seconds: f64) {
        if !offset_seconds.is_finite() {
            return;
        }
        self.seek_to_seconds(self.position().as_secs_f64() + offset_seconds);
    }

    /// Seek to an absolute position given in seconds
    ///
    /// Negative values seek to the start and values past the end are clamped;
    /// NaN is ignored.
    pub fn seek_to_seconds(&mut self, seconds: f64) {
        if seconds.is_nan() {
            return;
        }
        let duration = self.current_duration();
        let mut target = seconds.max(0.0);
        if !duration.is_zero() {
            target = target.min(duration.as_secs_f64());
        }
        match Duration::try_from_secs_f64(target) {
            Ok(position) => self.seek_to(position),
            Err(err) => debug!(%err, seconds, "Seek target out of range"),
        }
    }

    /// Set the volume (clamped to 0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if (volume - self.volume).abs() < f32::EPSILON {
            return;
        }
        self.volume = volume;
        self.apply_volume(Instant::now());
        self.emit_volume_changed();
    }

    /// Mute output (volume level is kept)
    pub fn mute(&mut self) {
        if !self.muted {
            self.muted = true;
            self.apply_volume(Instant::now());
            self.emit_volume_changed();
        }
    }

    /// Unmute output
    pub fn unmute(&mut self) {
        if self.muted {
            self.muted = false;
            self.apply_volume(Instant::now());
            self.emit_volume_changed();
        }
    }

    /// Toggle mute
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    // ===== Queue =====

    /// Append a track
    pub fn enqueue(&mut self, track: Track) {
        let previous = self.queue.current_instance();
        self.queue.append(track);
        self.after_queue_change(previous, self.wants_playback());
    }

    /// Insert a track after the current one
    pub fn enqueue_next(&mut self, track: Track) {
        let previous = self.queue.current_instance();
        self.queue.insert_after_current(track);
        self.after_queue_change(previous, self.wants_playback());
    }

    /// Replace the queue and start playing it
    pub fn play_now(&mut self, tracks: Vec<Track>) {
        let previous = self.queue.current_instance();
        self.queue.replace_all(tracks);
        self.after_queue_change(previous, true);
    }

    /// Remove the track at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        let previous = self.queue.current_instance();
        let autoplay = self.wants_playback();
        let removed = self.queue.remove_at(index)?;
        self.after_queue_change(previous, autoplay);
        Ok(removed)
    }

    /// Empty the queue and stop
    pub fn clear_queue(&mut self) {
        let previous = self.queue.current_instance();
        self.queue.clear();
        self.after_queue_change(previous, false);
    }

    /// Play the track at `index`
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        self.queue.set_cursor(index)?;
        self.emit_queue_changed();
        self.fader.cancel();
        self.load_current(LoadReason::TrackChange, true);
        Ok(())
    }

    /// Move a track within the queue
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let previous = self.queue.current_instance();
        self.queue.reorder(from, to)?;
        self.after_queue_change(previous, self.wants_playback());
        Ok(())
    }

    /// Switch shuffle on or off
    pub fn toggle_shuffle(&mut self) {
        let previous = self.queue.current_instance();
        self.queue.toggle_shuffle();
        self.after_queue_change(previous, self.wants_playback());
    }

    /// Set the repeat mode
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat_mode(mode);
        self.emit_queue_changed();
    }

    /// Revert the last remove/clear
    pub fn undo(&mut self) -> bool {
        let previous = self.queue.current_instance();
        let autoplay = self.wants_playback();
        if !self.queue.undo() {
            return false;
        }
        self.after_queue_change(previous, autoplay);
        true
    }

    /// Rate the track at `index`
    pub fn set_rating(&mut self, index: usize, rating: Option<u8>) -> Result<()> {
        self.queue.set_rating(index, rating)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Favorite/unfavorite the track at `index`
    pub fn set_favorite(&mut self, index: usize, favorite: bool) -> Result<()> {
        self.queue.set_favorite(index, favorite)?;
        self.emit_queue_changed();
        Ok(())
    }

    // ===== Equalizer =====

    /// Set one band's gain and rebuild the filter stage
    pub fn set_eq_gain(&mut self, band: usize, gain_db: f32) -> Result<()> {
        self.equalizer.set_gain(band, gain_db)?;
        self.rebuild_equalizer(true);
        Ok(())
    }

    /// Set one band's Q factor and rebuild the filter stage
    pub fn set_eq_q(&mut self, band: usize, q: f32) -> Result<()> {
        self.equalizer.set_q(band, q)?;
        self.rebuild_equalizer(true);
        Ok(())
    }

    /// Set every band's gain and rebuild the filter stage
    pub fn set_eq_gains(&mut self, gains: &[f32]) -> Result<()> {
        self.equalizer.set_gains(gains)?;
        self.rebuild_equalizer(true);
        Ok(())
    }

    /// Flatten the equalizer
    pub fn reset_equalizer(&mut self) {
        self.equalizer.reset();
        self.rebuild_equalizer(true);
    }

    // ===== Persistence =====

    /// Queue snapshot to write, if the pending write is due
    pub fn take_due_snapshot(&mut self, now: Instant) -> Option<QueueSnapshot> {
        self.queue.take_due_snapshot(now)
    }

    /// Queue snapshot to write if anything is pending (shutdown)
    pub fn flush_snapshot(&mut self) -> Option<QueueSnapshot> {
        self.queue.flush_snapshot()
    }

    /// When the pending queue write becomes due
    pub fn persistence_deadline(&self) -> Option<Instant> {
        self.queue.persistence_deadline()
    }

    // ===== Crossfade =====

    /// Replace crossfade settings; a fade in progress is abandoned
    pub fn set_crossfade(&mut self, settings: CrossfadeSettings) {
        self.fader.set_settings(settings.clone());
        self.config.crossfade = settings;
        self.apply_volume(Instant::now());
    }

    // ===== Accessors =====

    /// Controller state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The queue
    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// Equalizer settings
    pub fn equalizer(&self) -> &EqualizerSettings {
        self.equalizer.settings()
    }

    /// Configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// User volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Whether output is muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Unthrottled position of the loaded track
    pub fn position(&self) -> Duration {
        if self.is_loaded() {
            self.renderer.position()
        } else {
            Duration::ZERO
        }
    }

    /// Session state
    pub fn session(&self) -> SessionState {
        SessionState {
            playing: self.state == PlaybackState::Playing,
            position: self.position(),
            duration: self.current_duration(),
            volume: self.volume,
            muted: self.muted,
            consecutive_failures: self.recovery.consecutive_failures(),
            retry_count: self.recovery.retry_count(),
            next_track_preloaded: self.next_track_preloaded,
        }
    }

    /// The renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ===== Loading =====

    fn load_current(&mut self, reason: LoadReason, autoplay: bool) {
        let now = Instant::now();
        self.pending_retry = None;
        self.next_track_preloaded = false;
        self.preload_attempted = false;
        self.renderer.cancel_preload();
        if !self.fader.is_awaiting_fade_in() {
            self.fader.cancel();
        }
        self.apply_volume(now);

        let Some(track) = self.queue.current().cloned() else {
            self.unload();
            return;
        };
        let index = self.queue.current_index().unwrap_or(0);

        if reason != LoadReason::Retry {
            self.recovery.on_track_changed();
            self.scrobbler.reset_for(Some(track.id.clone()), now);
        }
        if reason == LoadReason::TrackChange {
            let previous_track_id = self.active.as_ref().map(|a| a.track_id.clone());
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id,
                index,
            });
            self.rebuild_equalizer(false);
        }
        self.throttle.reset();

        self.next_token += 1;
        let token = LoadToken(self.next_token);
        self.active = Some(ActiveTrack {
            token,
            track_id: track.id.clone(),
            autoplay,
            loaded: false,
            duration: track.duration(),
        });
        self.set_state(PlaybackState::Loading);

        debug!(%token, track_id = %track.id, index, ?reason, "Loading track");

        let Some(url) = track.playable_url.clone() else {
            self.handle_failure("track has no playable URL");
            return;
        };

        let request = LoadRequest {
            token,
            track_id: track.id.clone(),
            url,
            expected_duration: track.duration(),
        };
        if let Err(err) = self.renderer.load(request) {
            self.handle_failure(&err.to_string());
        }
    }

    fn unload(&mut self) {
        self.renderer.stop();
        self.renderer.cancel_preload();
        self.active = None;
        self.pending_retry = None;
        self.next_track_preloaded = false;
        self.fader.cancel();
        self.scrobbler.reset_for(None, Instant::now());
        self.apply_volume(Instant::now());
        self.set_state(PlaybackState::Idle);
    }

    fn move_cursor(&mut self, index: usize, autoplay: bool) {
        if let Err(err) = self.queue.set_cursor(index) {
            debug!(%err, index, "Cursor move rejected");
            return;
        }
        self.emit_queue_changed();
        self.fader.cancel();
        self.load_current(LoadReason::TrackChange, autoplay);
    }

    fn after_queue_change(&mut self, previous: Option<InstanceId>, autoplay: bool) {
        self.emit_queue_changed();

        let current = self.queue.current_instance();
        if current == previous {
            return;
        }

        self.fader.cancel();
        if current.is_some() {
            self.load_current(LoadReason::TrackChange, autoplay);
        } else {
            self.unload();
        }
    }

    fn wants_playback(&self) -> bool {
        match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Loading => self.active.as_ref().is_some_and(|a| a.autoplay),
            _ => false,
        }
    }

    fn is_loaded(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.loaded)
    }

    fn current_duration(&self) -> Duration {
        self.active
            .as_ref()
            .map(|a| a.duration)
            .or_else(|| self.queue.current().map(Track::duration))
            .unwrap_or_default()
    }

    /// Next entry for auto-advance purposes, if it is a different entry
    fn distinct_next(&self) -> Option<usize> {
        if self.queue.repeat_mode() == RepeatMode::One {
            return None;
        }
        self.queue
            .next_index()
            .filter(|next| Some(*next) != self.queue.current_index())
    }

    // ===== Renderer events =====

    fn process_renderer_events(&mut self, now: Instant) {
        // Handlers may trigger follow-up events (Loaded -> play -> Playing)
        for _ in 0..MAX_EVENT_ROUNDS {
            let events = self.renderer.drain_events();
            if events.is_empty() {
                return;
            }

            for event in events {
                let current = self.active.as_ref().map(|a| a.token);
                if current != Some(event.token()) {
                    debug!(token = %event.token(), current = ?current, "Ignoring stale renderer event");
                    continue;
                }

                match event {
                    RendererEvent::Loaded { duration, .. } => self.on_loaded(duration),
                    RendererEvent::Playing { .. } => self.on_playing(now),
                    RendererEvent::Ended { .. } => self.on_track_ended(),
                    RendererEvent::Error { message, .. } => self.handle_failure(&message),
                }
            }
        }
    }

    fn on_loaded(&mut self, duration: Duration) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.loaded = true;
        if !duration.is_zero() {
            active.duration = duration;
        }
        let autoplay = active.autoplay;

        self.renderer.seek(Duration::ZERO);
        if autoplay {
            self.renderer.play();
        } else {
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_playing(&mut self, now: Instant) {
        self.recovery.on_playing();
        if self.fader.is_awaiting_fade_in() {
            self.fader.begin_fade_in(now);
        }
        self.set_state(PlaybackState::Playing);
    }

    fn on_track_ended(&mut self) {
        if self.fader.is_fading_out() {
            self.fader.finish_fade_out();
        }

        let Some(index) = self.queue.current_index() else {
            self.unload();
            return;
        };
        if let Err(err) = self.queue.mark_played(index) {
            debug!(%err, index, "Could not mark track played");
        }

        if self.queue.repeat_mode() == RepeatMode::One {
            self.load_current(LoadReason::Replay, true);
            return;
        }

        match self.queue.next_index() {
            // Fade-out finished with the track; the incoming one fades in
            Some(next) if self.fader.is_awaiting_fade_in() => self.move_cursor_keeping_fade(next),
            Some(next) => self.move_cursor(next, true),
            None => {
                debug!("Reached end of queue");
                self.fader.cancel();
                self.apply_volume(Instant::now());
                self.set_state(PlaybackState::Ended);
            }
        }
    }

    fn handle_failure(&mut self, message: &str) {
        let Some(track_id) = self.active.as_ref().map(|a| a.track_id.clone()) else {
            return;
        };
        warn!(%track_id, message, "Playback failed");

        self.fader.cancel();
        self.apply_volume(Instant::now());
        self.set_state(PlaybackState::Error);

        match self.recovery.on_error() {
            RecoveryAction::Retry { delay } => {
                self.pending_events
                    .push(PlaybackEvent::Notice(PlaybackNotice::Retrying {
                        track_id,
                        attempt: self.recovery.retry_count(),
                    }));
                self.pending_retry = Some(Instant::now() + delay);
            }
            RecoveryAction::Skip => {
                let consecutive_failures = self.recovery.consecutive_failures();
                warn!(%track_id, consecutive_failures, "Skipping track");
                self.pending_events
                    .push(PlaybackEvent::Notice(PlaybackNotice::Skipping {
                        track_id,
                        consecutive_failures,
                    }));

                match self.queue.next_index() {
                    Some(next) => self.move_cursor(next, true),
                    None => {
                        info!("No track to skip to; stopping");
                        self.renderer.stop();
                        self.active = None;
                    }
                }
            }
            RecoveryAction::Stop => {
                let consecutive_failures = self.recovery.consecutive_failures();
                error!(consecutive_failures, "Stopping playback after repeated errors");
                self.renderer.stop();
                self.active = None;
                self.pending_retry = None;
                self.pending_events
                    .push(PlaybackEvent::Notice(PlaybackNotice::StoppedAfterErrors {
                        consecutive_failures,
                    }));
            }
        }
    }

    // ===== Timers =====

    fn maybe_preload(&mut self, position: Duration, duration: Duration) {
        if self.preload_attempted || duration.is_zero() {
            return;
        }
        if position.as_secs_f64() < duration.as_secs_f64() * self.config.preload_ratio {
            return;
        }
        self.preload_attempted = true;

        let Some(next) = self.distinct_next().and_then(|i| self.queue.get(i)).cloned() else {
            return;
        };
        let Some(url) = next.playable_url.as_deref() else {
            return;
        };

        match self.renderer.preload(url) {
            Ok(()) => {
                debug!(track_id = %next.id, "Preloaded next track");
                self.next_track_preloaded = true;
                self.pending_events
                    .push(PlaybackEvent::NextTrackPrepared { track_id: next.id });
            }
            Err(err) => warn!(track_id = %next.id, %err, "Preload failed"),
        }
    }

    fn maybe_start_crossfade(&mut self, now: Instant, position: Duration, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let remaining = duration.saturating_sub(position);
        if self.fader.should_start(remaining) && self.distinct_next().is_some() {
            debug!(remaining_ms = remaining.as_millis() as u64, "Starting crossfade");
            self.fader.start_fade_out(now, remaining);
        }
    }

    fn advance_fader(&mut self, now: Instant) {
        match self.fader.tick(now) {
            FadeTick::Idle => {}
            FadeTick::Gain(_) | FadeTick::FadeInComplete => self.apply_volume(now),
            FadeTick::FadeOutComplete => {
                self.apply_volume(now);
                self.advance_after_fade();
            }
        }
    }

    fn advance_after_fade(&mut self) {
        let (Some(index), Some(next)) = (self.queue.current_index(), self.distinct_next()) else {
            self.fader.cancel();
            self.apply_volume(Instant::now());
            return;
        };
        if let Err(err) = self.queue.mark_played(index) {
            debug!(%err, index, "Could not mark track played");
        }
        self.move_cursor_keeping_fade(next);
    }

    fn move_cursor_keeping_fade(&mut self, index: usize) {
        if let Err(err) = self.queue.set_cursor(index) {
            debug!(%err, index, "Cursor move rejected");
            self.fader.cancel();
            return;
        }
        self.emit_queue_changed();
        self.load_current(LoadReason::TrackChange, true);
    }

    // ===== Output =====

    fn apply_volume(&mut self, now: Instant) {
        let gain = if self.muted {
            0.0
        } else {
            self.volume * self.fader.gain(now)
        };
        self.renderer.set_volume(gain);
    }

    fn rebuild_equalizer(&mut self, announce: bool) {
        let stage = self.equalizer.begin_rebuild().build();
        match self.equalizer.attach(stage) {
            Ok(stage) => self.renderer.set_filter_stage(stage),
            Err(err) => debug!(%err, "Filter stage superseded"),
        }
        if announce {
            self.pending_events.push(PlaybackEvent::EqualizerChanged {
                gains: self.equalizer.gains(),
            });
        }
    }

    // ===== Events =====

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "Playback state changed");
        self.state = state;
        self.pending_events.push(PlaybackEvent::StateChanged {
            playing: state == PlaybackState::Playing,
            current_index: self.queue.current_index(),
            state,
        });
        self.emit_now_playing(self.position());
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            volume: self.volume,
            muted: self.muted,
        });
    }

    fn emit_position(&mut self, position: Duration, duration: Duration) {
        self.pending_events.push(PlaybackEvent::PositionChanged {
            position_ms: position.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        });
        self.emit_now_playing(position);
    }

    fn emit_now_playing(&mut self, position: Duration) {
        let Some(track) = self.queue.current() else {
            return;
        };
        let info = NowPlayingInfo {
            title: track.title.clone(),
            artist: track.artist.name.clone(),
            album: track.album.name.clone(),
            artwork_url: track.artwork_url.clone(),
            duration_seconds: self.current_duration().as_secs_f64(),
            position_seconds: position.as_secs_f64(),
            playing: self.state == PlaybackState::Playing,
        };
        self.pending_events.push(PlaybackEvent::NowPlaying(info));
    }
}
