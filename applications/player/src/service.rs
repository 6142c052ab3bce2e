//! Player service
//!
//! Owns the playback controller and connects it to the outside world: a
//! command channel in, a broadcast channel of playback events out, scrobble
//! reports to the `ScrobbleSink`, and queue/preference/equalizer state to the
//! `KeyValueStore`.

use crate::commands::Command;
use crate::error::{PlayerError, Result};
use aria_audio::EqualizerSettings;
use aria_core::storage::{
    load_json, save_json, EQUALIZER_SETTINGS_KEY, PLAYBACK_PREFERENCES_KEY, QUEUE_STATE_KEY,
};
use aria_core::{KeyValueStore, ScrobbleReport, ScrobbleSink, Track};
use aria_playback::{
    AudioRenderer, PersistedQueue, PlaybackConfig, PlaybackController, PlaybackEvent,
    PlaybackPreferences, PlaybackState, QueueSnapshot, RepeatMode,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Controller tick period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

const REQUEST_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

/// Request sent to a running service
#[derive(Debug)]
pub enum PlayerRequest {
    /// Apply a command; `Quit` stops the service
    Command(Command),
    /// Reply with a status snapshot on the given channel
    Status(oneshot::Sender<PlayerStatus>),
}

/// Point-in-time view of the player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// Controller state
    pub state: PlaybackState,
    /// Cursor position in display order
    pub current_index: Option<usize>,
    /// Track under the cursor
    pub current: Option<Track>,
    /// Number of queued tracks
    pub queue_length: usize,
    /// Playback position of the current track
    pub position_ms: u64,
    /// Duration of the current track, 0 when unknown
    pub duration_ms: u64,
    /// User volume (0.0 - 1.0), before mute and crossfade
    pub volume: f32,
    pub muted: bool,
    pub repeat_mode: RepeatMode,
    /// Whether the queue is in shuffled order
    pub shuffle_enabled: bool,
    /// Band gains in dB, lowest band first
    pub equalizer_gains: Vec<f32>,
}

/// Cloneable handle to a running service
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    requests: mpsc::Sender<PlayerRequest>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    /// Queue a command
    pub async fn send(&self, command: Command) -> Result<()> {
        self.requests
            .send(PlayerRequest::Command(command))
            .await
            .map_err(|_| PlayerError::ServiceStopped)
    }

    /// Ask for the current status
    pub async fn status(&self) -> Result<PlayerStatus> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(PlayerRequest::Status(reply))
            .await
            .map_err(|_| PlayerError::ServiceStopped)?;
        response.await.map_err(|_| PlayerError::ServiceStopped)
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// Single owner of a `PlaybackController`
///
/// Commands and status requests are served on one task together with the
/// controller tick, so the controller never needs locking. Events are
/// broadcast after every step and state is persisted when the controller
/// reports a due snapshot.
pub struct PlayerService<R: AudioRenderer> {
    controller: PlaybackController<R>,
    store: Arc<dyn KeyValueStore>,
    scrobble_sink: Option<Arc<dyn ScrobbleSink>>,
    events: broadcast::Sender<PlaybackEvent>,
    tick_interval: Duration,
}

impl<R: AudioRenderer + 'static> PlayerService<R> {
    /// Build the controller and restore persisted state
    ///
    /// Unreadable stored values are logged and replaced by defaults.
    pub async fn start(
        renderer: R,
        config: PlaybackConfig,
        store: Arc<dyn KeyValueStore>,
        scrobble_sink: Option<Arc<dyn ScrobbleSink>>,
    ) -> Self {
        let equalizer = load_equalizer(store.as_ref()).await;
        let mut controller = PlaybackController::with_equalizer(renderer, config, equalizer);

        let queue = load_or_warn::<PersistedQueue>(store.as_ref(), QUEUE_STATE_KEY).await;
        let preferences =
            load_or_warn::<PlaybackPreferences>(store.as_ref(), PLAYBACK_PREFERENCES_KEY).await;
        if queue.is_some() || preferences.is_some() {
            let queue = queue.unwrap_or_default();
            info!(tracks = queue.items.len(), current = queue.current, "Restoring queue");
            controller.hydrate(queue, preferences.unwrap_or_default());
        }

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            controller,
            store,
            scrobble_sink,
            events,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Override the tick period
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Run the service on its own task
    pub fn spawn(self) -> (PlayerHandle, JoinHandle<()>) {
        let (requests, receiver) = mpsc::channel(REQUEST_BUFFER);
        let handle = PlayerHandle {
            requests,
            events: self.events.clone(),
        };
        let task = tokio::spawn(self.run(receiver));
        (handle, task)
    }

    /// Serve requests until `Quit` or until every handle is dropped
    pub async fn run(mut self, mut requests: mpsc::Receiver<PlayerRequest>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_ms = self.tick_interval.as_millis() as u64, "Player service started");

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(PlayerRequest::Command(Command::Quit)) | None => break,
                    Some(PlayerRequest::Command(command)) => self.apply(command),
                    Some(PlayerRequest::Status(reply)) => {
                        // Requester may have given up
                        let _ = reply.send(self.status());
                    }
                },
                _ = ticker.tick() => self.controller.tick(Instant::now()),
            }

            self.flush_events().await;
            self.persist_due(Instant::now()).await;
        }

        self.shutdown().await;
    }

    /// Tick once and push everything that came out of it
    pub async fn step(&mut self, now: Instant) {
        self.controller.tick(now);
        self.flush_events().await;
        self.persist_due(now).await;
    }

    /// Apply a command to the controller
    ///
    /// Invalid queue operations are rejected without side effects.
    pub fn apply(&mut self, command: Command) {
        debug!(?command, "Applying command");
        let controller = &mut self.controller;

        match command {
            Command::Play => controller.play(),
            Command::Pause => controller.pause(),
            Command::TogglePlay => controller.toggle_play(),
            Command::Stop => controller.stop(),
            Command::Next => controller.skip_next(),
            Command::Previous => controller.skip_previous(),
            Command::SeekTo(seconds) => controller.seek_to_seconds(seconds),
            Command::SeekBy(offset) => controller.seek_by(offset),
            Command::Volume(volume) => controller.set_volume(volume),
            Command::Mute => controller.mute(),
            Command::Unmute => controller.unmute(),
            Command::ToggleMute => controller.toggle_mute(),

            Command::Enqueue(track) => controller.enqueue(*track),
            Command::EnqueueNext(track) => controller.enqueue_next(*track),
            Command::PlayNow(tracks) => controller.play_now(tracks),
            Command::Remove(index) => log_rejected(controller.remove_at(index)),
            Command::Clear => controller.clear_queue(),
            Command::Jump(index) => log_rejected(controller.jump_to(index)),
            Command::Move { from, to } => log_rejected(controller.reorder(from, to)),
            Command::Shuffle => controller.toggle_shuffle(),
            Command::Repeat(mode) => controller.set_repeat_mode(mode),
            Command::Undo => {
                if !controller.undo() {
                    debug!("Nothing to undo");
                }
            }
            Command::Rate { index, rating } => log_rejected(controller.set_rating(index, rating)),
            Command::Favorite { index, favorite } => {
                log_rejected(controller.set_favorite(index, favorite));
            }

            Command::EqGain { band, gain_db } => log_rejected(controller.set_eq_gain(band, gain_db)),
            Command::EqQ { band, q } => log_rejected(controller.set_eq_q(band, q)),
            Command::EqGains(gains) => log_rejected(controller.set_eq_gains(&gains)),
            Command::EqReset => controller.reset_equalizer(),

            Command::Status | Command::Quit => {}
        }
    }

    /// Current status
    pub fn status(&self) -> PlayerStatus {
        let queue = self.controller.queue();
        let session = self.controller.session();
        PlayerStatus {
            state: self.controller.state(),
            current_index: queue.current_index(),
            current: queue.current().cloned(),
            queue_length: queue.len(),
            position_ms: session.position.as_millis() as u64,
            duration_ms: session.duration.as_millis() as u64,
            volume: session.volume,
            muted: session.muted,
            repeat_mode: queue.repeat_mode(),
            shuffle_enabled: queue.shuffle_enabled(),
            equalizer_gains: self.controller.equalizer().gains(),
        }
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Controller, for inspection
    pub fn controller(&self) -> &PlaybackController<R> {
        &self.controller
    }

    /// Controller, for driving it directly without a command
    ///
    /// Events raised this way are published on the next `step`.
    pub fn controller_mut(&mut self) -> &mut PlaybackController<R> {
        &mut self.controller
    }

    /// Flush pending persistence and stop playback
    pub async fn shutdown(&mut self) {
        if let Some(snapshot) = self.controller.flush_snapshot() {
            write_snapshot(self.store.as_ref(), &snapshot).await;
        }
        self.controller.stop();
        self.flush_events().await;
        info!("Player service stopped");
    }

    async fn flush_events(&mut self) {
        let store = Arc::clone(&self.store);
        for event in self.controller.drain_events() {
            match &event {
                PlaybackEvent::Scrobble(report) => self.submit_scrobble(report.clone()),
                PlaybackEvent::EqualizerChanged { gains } => {
                    save_equalizer(store.as_ref(), gains).await;
                }
                PlaybackEvent::Notice(notice) if notice.is_fatal() => {
                    error!(?notice, "Playback stopped");
                }
                _ => {}
            }

            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    async fn persist_due(&mut self, now: Instant) {
        if let Some(snapshot) = self.controller.take_due_snapshot(now) {
            let store = Arc::clone(&self.store);
            write_snapshot(store.as_ref(), &snapshot).await;
        }
    }

    fn submit_scrobble(&self, report: ScrobbleReport) {
        let Some(sink) = self.scrobble_sink.as_ref().map(Arc::clone) else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = sink.submit(&report).await {
                warn!(
                    track_id = %report.song_id,
                    scrobble_type = report.scrobble_type.as_str(),
                    %err,
                    "Scrobble report dropped"
                );
            }
        });
    }
}

async fn write_snapshot(store: &dyn KeyValueStore, snapshot: &QueueSnapshot) {
    if let Err(err) = save_json(store, QUEUE_STATE_KEY, &snapshot.queue).await {
        warn!(%err, "Failed to persist queue");
    }
    if let Err(err) = save_json(store, PLAYBACK_PREFERENCES_KEY, &snapshot.preferences).await {
        warn!(%err, "Failed to persist playback preferences");
    }
    debug!(tracks = snapshot.queue.items.len(), "Queue persisted");
}

async fn save_equalizer(store: &dyn KeyValueStore, gains: &[f32]) {
    let gains = gains.to_vec();
    if let Err(err) = save_json(store, EQUALIZER_SETTINGS_KEY, &gains).await {
        warn!(%err, "Failed to persist equalizer settings");
    }
}

fn log_rejected<T>(result: aria_playback::Result<T>) {
    if let Err(err) = result {
        warn!(%err, "Command rejected");
    }
}

async fn load_or_warn<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    match load_json(store, key).await {
        Ok(value) => value,
        Err(err) => {
            warn!(key, %err, "Ignoring unreadable stored value");
            None
        }
    }
}

async fn load_equalizer(store: &dyn KeyValueStore) -> EqualizerSettings {
    let Some(gains) = load_or_warn::<Vec<f32>>(store, EQUALIZER_SETTINGS_KEY).await else {
        return EqualizerSettings::default();
    };
    match EqualizerSettings::from_gains(&gains) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(%err, "Ignoring invalid equalizer settings");
            EqualizerSettings::default()
        }
    }
}
