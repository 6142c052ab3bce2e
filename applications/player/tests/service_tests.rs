/// Player service tests
///
/// Run under paused tokio time; the headless renderer follows the same clock.
use async_trait::async_trait;
use aria_core::storage::{
    load_json, save_json, EQUALIZER_SETTINGS_KEY, PLAYBACK_PREFERENCES_KEY, QUEUE_STATE_KEY,
};
use aria_core::{
    AlbumRef, ArtistRef, KeyValueStore, MemoryStore, ScrobbleReport, ScrobbleSink, ScrobbleType,
    Track,
};
use aria_player::{Command, HeadlessRenderer, PlayerError, PlayerService};
use aria_playback::testing::ScriptedRenderer;
use aria_playback::{
    PersistedQueue, PlaybackConfig, PlaybackEvent, PlaybackNotice, PlaybackPreferences,
    PlaybackState, RepeatMode,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

fn track(id: &str, secs: u64) -> Track {
    Track::new(
        id,
        format!("Title {}", id),
        ArtistRef::new("ar1", "Artist"),
        AlbumRef::new("al1", "Album"),
        secs * 1000,
    )
    .with_playable_url(format!("https://media.test/{}.flac", id))
}

fn broken_track(id: &str) -> Track {
    Track::new(
        id,
        "Broken",
        ArtistRef::new("ar1", "Artist"),
        AlbumRef::new("al1", "Album"),
        60_000,
    )
    .with_playable_url(format!("ftp://media.test/{}.flac", id))
}

/// Forwards every report to a channel
struct ChannelSink {
    reports: mpsc::UnboundedSender<ScrobbleReport>,
}

#[async_trait]
impl ScrobbleSink for ChannelSink {
    async fn submit(&self, report: &ScrobbleReport) -> aria_core::Result<()> {
        let _ = self.reports.send(report.clone());
        Ok(())
    }
}

struct RejectingSink;

#[async_trait]
impl ScrobbleSink for RejectingSink {
    async fn submit(&self, _report: &ScrobbleReport) -> aria_core::Result<()> {
        Err(aria_core::AriaError::network("endpoint down"))
    }
}

async fn headless_service(store: Arc<MemoryStore>) -> PlayerService<HeadlessRenderer> {
    PlayerService::start(
        HeadlessRenderer::new(),
        PlaybackConfig::default(),
        store,
        None,
    )
    .await
}

async fn stored_queue(store: &MemoryStore) -> Option<PersistedQueue> {
    load_json(store, QUEUE_STATE_KEY).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn restores_persisted_session_on_start() {
    let store = Arc::new(MemoryStore::new());
    let queue = PersistedQueue {
        items: vec![track("a", 120).minimal(), track("b", 150).minimal()],
        current: 1,
    };
    let preferences = PlaybackPreferences {
        repeat_mode: RepeatMode::All,
        shuffle_enabled: false,
    };
    let mut gains = vec![0.0; 10];
    gains[2] = 4.5;
    save_json(store.as_ref(), QUEUE_STATE_KEY, &queue).await.unwrap();
    save_json(store.as_ref(), PLAYBACK_PREFERENCES_KEY, &preferences)
        .await
        .unwrap();
    save_json(store.as_ref(), EQUALIZER_SETTINGS_KEY, &gains)
        .await
        .unwrap();

    let mut service = headless_service(Arc::clone(&store)).await;
    service.step(Instant::now()).await;

    let status = service.status();
    assert_eq!(status.queue_length, 2);
    assert_eq!(status.current_index, Some(1));
    assert_eq!(status.current.unwrap().id.as_str(), "b");
    assert_eq!(status.repeat_mode, RepeatMode::All);
    assert_eq!(status.equalizer_gains, gains);
    // Restored but not auto-started
    assert_eq!(status.state, PlaybackState::Paused);
    assert!(!service.controller().renderer().is_playing());
    assert_eq!(service.controller().renderer().stage_generation(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn unreadable_stored_values_fall_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(QUEUE_STATE_KEY, "not json".to_string())
        .await
        .unwrap();
    save_json(store.as_ref(), EQUALIZER_SETTINGS_KEY, &vec![1.0_f32, 2.0])
        .await
        .unwrap();

    let service = headless_service(store).await;
    let status = service.status();
    assert_eq!(status.queue_length, 0);
    assert_eq!(status.state, PlaybackState::Idle);
    assert!(status.equalizer_gains.iter().all(|g| *g == 0.0));
}

#[tokio::test(start_paused = true)]
async fn queue_changes_are_persisted() {
    let store = Arc::new(MemoryStore::new());
    let mut service = headless_service(Arc::clone(&store)).await;

    service.apply(Command::PlayNow(vec![track("a", 120), track("b", 120)]));
    service.step(Instant::now()).await;

    let queue = stored_queue(&store).await.unwrap();
    assert_eq!(queue.items.len(), 2);
    assert_eq!(queue.current, 0);

    // Routine edits wait for the quiet period
    service.apply(Command::Enqueue(Box::new(track("c", 120))));
    service.step(Instant::now()).await;
    assert_eq!(stored_queue(&store).await.unwrap().items.len(), 2);

    tokio::time::advance(Duration::from_millis(1100)).await;
    service.step(Instant::now()).await;
    let queue = stored_queue(&store).await.unwrap();
    assert_eq!(queue.items.len(), 3);
    assert_eq!(queue.items[2].id.as_str(), "c");

    service.apply(Command::Repeat(RepeatMode::One));
    service.shutdown().await;
    let preferences: PlaybackPreferences = load_json(store.as_ref(), PLAYBACK_PREFERENCES_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(preferences.repeat_mode, RepeatMode::One);
}

#[tokio::test(start_paused = true)]
async fn equalizer_changes_are_saved() {
    let store = Arc::new(MemoryStore::new());
    let mut service = headless_service(Arc::clone(&store)).await;

    service.apply(Command::EqGain {
        band: 0,
        gain_db: 3.0,
    });
    service.step(Instant::now()).await;

    let gains: Vec<f32> = load_json(store.as_ref(), EQUALIZER_SETTINGS_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gains.len(), 10);
    assert_eq!(gains[0], 3.0);

    // Out-of-range band is rejected without touching the stored value
    service.apply(Command::EqGain {
        band: 42,
        gain_db: 1.0,
    });
    service.step(Instant::now()).await;
    let gains: Vec<f32> = load_json(store.as_ref(), EQUALIZER_SETTINGS_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gains[0], 3.0);
}

#[tokio::test(start_paused = true)]
async fn q_changes_reach_the_controller() {
    let store = Arc::new(MemoryStore::new());
    let mut service = headless_service(Arc::clone(&store)).await;

    service.apply("eq-q 5 3.0".parse().unwrap());
    service.step(Instant::now()).await;
    assert_eq!(service.controller().equalizer().bands()[5].q(), 3.0);

    service.apply(Command::EqQ {
        band: 5,
        q: f32::NAN,
    });
    service.step(Instant::now()).await;
    assert_eq!(service.controller().equalizer().bands()[5].q(), 3.0);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_seeks_keep_the_service_running() {
    let store = Arc::new(MemoryStore::new());
    let service = headless_service(Arc::clone(&store)).await;
    let (handle, task) = service.spawn();

    handle
        .send(Command::PlayNow(vec![track("a", 120), track("b", 120)]))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for line in ["forward 1e20", "back 1e20", "seek 1e300", "seek -5"] {
        handle.send(line.parse().unwrap()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = handle.status().await.unwrap();
        assert!(status.position_ms <= status.duration_ms);
    }
    handle.send(Command::SeekTo(f64::INFINITY)).await.unwrap();
    handle.send(Command::SeekBy(f64::NAN)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.status().await.is_ok());

    handle.send(Command::Quit).await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn storage_failures_do_not_stop_playback() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_writes(true).await;

    let mut service = PlayerService::start(
        ScriptedRenderer::new(),
        PlaybackConfig::default(),
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        None,
    )
    .await;

    service.apply(Command::PlayNow(vec![track("a", 120)]));
    service.step(Instant::now()).await;
    assert_eq!(service.status().state, PlaybackState::Playing);
    assert!(store.is_empty().await);

    store.set_fail_writes(false).await;
    service.apply(Command::Enqueue(Box::new(track("b", 120))));
    tokio::time::advance(Duration::from_secs(2)).await;
    service.step(Instant::now()).await;
    assert_eq!(stored_queue(&store).await.unwrap().items.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn scrobbles_reach_the_sink() {
    let (reports_tx, mut reports) = mpsc::unbounded_channel();
    let sink = Arc::new(ChannelSink {
        reports: reports_tx,
    });
    let mut service = PlayerService::start(
        HeadlessRenderer::new(),
        PlaybackConfig::default(),
        Arc::new(MemoryStore::new()),
        Some(sink),
    )
    .await;

    service.apply(Command::PlayNow(vec![track("a", 100)]));
    service.step(Instant::now()).await;

    for _ in 0..24 {
        tokio::time::advance(Duration::from_millis(500)).await;
        service.step(Instant::now()).await;
    }

    let report = reports.recv().await.unwrap();
    assert_eq!(report.song_id.as_str(), "a");
    assert_eq!(report.scrobble_type, ScrobbleType::NowPlaying);
    assert_eq!(report.player_name, "aria");
}

#[tokio::test(start_paused = true)]
async fn rejected_scrobbles_are_dropped() {
    let mut service = PlayerService::start(
        HeadlessRenderer::new(),
        PlaybackConfig::default(),
        Arc::new(MemoryStore::new()),
        Some(Arc::new(RejectingSink)),
    )
    .await;

    service.apply(Command::PlayNow(vec![track("a", 100)]));
    for _ in 0..30 {
        tokio::time::advance(Duration::from_millis(500)).await;
        service.step(Instant::now()).await;
    }
    tokio::task::yield_now().await;

    assert_eq!(service.status().state, PlaybackState::Playing);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_are_broadcast() {
    let mut service = headless_service(Arc::new(MemoryStore::new())).await;
    let mut events = service.subscribe();

    service.apply(Command::PlayNow(vec![
        broken_track("x"),
        broken_track("y"),
        broken_track("z"),
        broken_track("w"),
    ]));
    for _ in 0..40 {
        service.step(Instant::now()).await;
        tokio::time::advance(Duration::from_millis(250)).await;
    }

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(received.iter().any(|e| matches!(
        e,
        PlaybackEvent::Notice(PlaybackNotice::StoppedAfterErrors {
            consecutive_failures: 3
        })
    )));
    assert_eq!(service.status().state, PlaybackState::Error);
    assert_eq!(service.status().current_index, Some(2));
}

#[tokio::test(start_paused = true)]
async fn run_loop_serves_commands_until_quit() {
    let store = Arc::new(MemoryStore::new());
    let service = headless_service(Arc::clone(&store)).await;
    let (handle, task) = service.spawn();
    let mut events = handle.subscribe();

    handle
        .send(Command::PlayNow(vec![track("a", 120), track("b", 120)]))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.current.unwrap().id.as_str(), "a");

    handle.send(Command::Next).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.status().await.unwrap().current_index, Some(1));

    let mut saw_track_change = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PlaybackEvent::TrackChanged { index: 1, .. }) {
            saw_track_change = true;
        }
    }
    assert!(saw_track_change);

    handle.send(Command::Quit).await.unwrap();
    task.await.unwrap();

    let queue = stored_queue(&store).await.unwrap();
    assert_eq!(queue.items.len(), 2);
    assert_eq!(queue.current, 1);

    assert!(matches!(
        handle.send(Command::Play).await,
        Err(PlayerError::ServiceStopped)
    ));
    assert!(matches!(
        handle.status().await,
        Err(PlayerError::ServiceStopped)
    ));
}
