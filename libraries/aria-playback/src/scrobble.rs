//! Scrobble scheduling
//!
//! Samples progress on a fixed interval and emits at most one "now playing"
//! and one "played" report per track. Flags reset whenever the tracked track
//! changes. The scheduler never sends anything itself; reports are handed to
//! the caller, which delivers them fire-and-forget.

use aria_core::{ScrobbleReport, ScrobbleType, TrackId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Per-track scrobble thresholds and flags
#[derive(Debug, Clone)]
pub struct ScrobbleScheduler {
    interval: Duration,
    now_playing_threshold: Duration,
    completion_ratio: f64,
    player_name: String,

    track_id: Option<TrackId>,
    reported_now_playing: bool,
    reported_completed: bool,
    next_check: Option<Instant>,
}

impl ScrobbleScheduler {
    /// Create a scheduler
    pub fn new(
        interval: Duration,
        now_playing_threshold: Duration,
        completion_ratio: f64,
        player_name: impl Into<String>,
    ) -> Self {
        Self {
            interval,
            now_playing_threshold,
            completion_ratio,
            player_name: player_name.into(),
            track_id: None,
            reported_now_playing: false,
            reported_completed: false,
            next_check: None,
        }
    }

    /// Start tracking `track_id` (or nothing); clears both flags
    pub fn reset_for(&mut self, track_id: Option<TrackId>, now: Instant) {
        self.next_check = track_id.as_ref().map(|_| now + self.interval);
        self.track_id = track_id;
        self.reported_now_playing = false;
        self.reported_completed = false;
    }

    /// Currently tracked track
    pub fn track_id(&self) -> Option<&TrackId> {
        self.track_id.as_ref()
    }

    /// Whether "now playing" went out for the current track
    pub fn reported_now_playing(&self) -> bool {
        self.reported_now_playing
    }

    /// Whether "played" went out for the current track
    pub fn reported_completed(&self) -> bool {
        self.reported_completed
    }

    /// Interval-gated check; returns reports that became due
    pub fn tick(&mut self, now: Instant, position: Duration, duration: Duration) -> Vec<ScrobbleReport> {
        match self.next_check {
            Some(due) if due <= now => {
                self.next_check = Some(now + self.interval);
                self.check(position, duration)
            }
            _ => Vec::new(),
        }
    }

    /// Threshold evaluation without the interval gate
    pub fn check(&mut self, position: Duration, duration: Duration) -> Vec<ScrobbleReport> {
        let Some(track_id) = self.track_id.clone() else {
            return Vec::new();
        };
        let mut reports = Vec::new();

        if !self.reported_now_playing && position > self.now_playing_threshold {
            self.reported_now_playing = true;
            reports.push(self.report(&track_id, ScrobbleType::NowPlaying, position));
        }

        if !self.reported_completed
            && !duration.is_zero()
            && position.as_secs_f64() > self.completion_ratio * duration.as_secs_f64()
        {
            self.reported_completed = true;
            reports.push(self.report(&track_id, ScrobbleType::Played, position));
        }

        for report in &reports {
            debug!(
                track_id = %report.song_id,
                scrobble_type = report.scrobble_type.as_str(),
                played_ms = report.played_duration,
                "Scrobble due"
            );
        }
        reports
    }

    fn report(&self, track_id: &TrackId, scrobble_type: ScrobbleType, position: Duration) -> ScrobbleReport {
        ScrobbleReport {
            song_id: track_id.clone(),
            player_name: self.player_name.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            scrobble_type,
            played_duration: position.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> ScrobbleScheduler {
        ScrobbleScheduler::new(Duration::from_secs(2), Duration::from_secs(10), 0.7, "aria")
    }

    const MINUTES_3: Duration = Duration::from_secs(180);

    #[test]
    fn nothing_before_thresholds() {
        let mut s = scheduler();
        s.reset_for(Some(TrackId::new("t")), Instant::now());
        assert!(s.check(Duration::from_secs(10), MINUTES_3).is_empty());
    }

    #[test]
    fn now_playing_then_played_once_each() {
        let mut s = scheduler();
        s.reset_for(Some(TrackId::new("t")), Instant::now());

        let first = s.check(Duration::from_secs(11), MINUTES_3);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].scrobble_type, ScrobbleType::NowPlaying);
        assert_eq!(first[0].played_duration, 11_000);
        assert_eq!(first[0].player_name, "aria");

        assert!(s.check(Duration::from_secs(100), MINUTES_3).is_empty());

        let second = s.check(Duration::from_secs(127), MINUTES_3);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].scrobble_type, ScrobbleType::Played);

        for _ in 0..10 {
            assert!(s.check(Duration::from_secs(170), MINUTES_3).is_empty());
        }
    }

    #[test]
    fn both_reports_in_one_check_after_seek() {
        let mut s = scheduler();
        s.reset_for(Some(TrackId::new("t")), Instant::now());
        let reports = s.check(Duration::from_secs(150), MINUTES_3);
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn zero_duration_never_completes() {
        let mut s = scheduler();
        s.reset_for(Some(TrackId::new("t")), Instant::now());
        let reports = s.check(Duration::from_secs(500), Duration::ZERO);
        assert_eq!(reports.len(), 1);
        assert!(!s.reported_completed());
    }

    #[test]
    fn track_change_resets_flags() {
        let mut s = scheduler();
        let now = Instant::now();
        s.reset_for(Some(TrackId::new("a")), now);
        s.check(Duration::from_secs(150), MINUTES_3);

        s.reset_for(Some(TrackId::new("b")), now);
        assert!(!s.reported_now_playing());
        let reports = s.check(Duration::from_secs(150), MINUTES_3);
        assert!(reports.iter().all(|r| r.song_id.as_str() == "b"));
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn no_track_no_reports() {
        let mut s = scheduler();
        s.reset_for(None, Instant::now());
        assert!(s.check(Duration::from_secs(150), MINUTES_3).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_respects_interval() {
        let mut s = scheduler();
        s.reset_for(Some(TrackId::new("t")), Instant::now());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(s.tick(Instant::now(), Duration::from_secs(20), MINUTES_3).is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(s.tick(Instant::now(), Duration::from_secs(20), MINUTES_3).len(), 1);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(s.tick(Instant::now(), Duration::from_secs(150), MINUTES_3).is_empty());

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(s.tick(Instant::now(), Duration::from_secs(150), MINUTES_3).len(), 1);
    }
}
