//! Write-coalescing persistence scheduler
//!
//! A single pending-write slot with a deadline. Routine mutations push the
//! deadline out by the debounce delay; destructive ones set it to "now" and
//! cannot be pushed back by later routine mutations. The snapshot itself is
//! taken when the slot fires, so the write always carries the latest state.

use aria_core::MinimalTrack;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::types::PlaybackPreferences;

/// How urgently a mutation must reach storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Coalesce; write after the debounce delay
    Debounced,
    /// Write on the next poll
    Immediate,
}

/// Persisted queue (`queueState` key)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedQueue {
    /// Minimized tracks in queue order
    pub items: Vec<MinimalTrack>,
    /// Cursor (0 when empty)
    pub current: usize,
}

/// Everything written when the slot fires
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    /// Queue items and cursor
    pub queue: PersistedQueue,
    /// Repeat/shuffle preferences
    pub preferences: PlaybackPreferences,
}

/// Pending-write slot
#[derive(Debug, Clone)]
pub struct PersistenceScheduler {
    debounce: Duration,
    deadline: Option<Instant>,
    immediate: bool,
}

impl PersistenceScheduler {
    /// Create a scheduler with the given debounce delay
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
            immediate: false,
        }
    }

    /// Record a mutation
    pub fn request(&mut self, mode: WriteMode, now: Instant) {
        match mode {
            WriteMode::Immediate => {
                self.deadline = Some(now);
                self.immediate = true;
            }
            WriteMode::Debounced => {
                if self.immediate && self.deadline.is_some() {
                    return;
                }
                self.deadline = Some(now + self.debounce);
            }
        }
    }

    /// Whether a write is waiting
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending write fires
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the slot if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.immediate = false;
                true
            }
            _ => false,
        }
    }

    /// Consume the slot regardless of deadline (shutdown)
    pub fn flush(&mut self) -> bool {
        let pending = self.deadline.take().is_some();
        self.immediate = false;
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_secs(1);

    #[test]
    fn debounced_writes_coalesce() {
        let start = Instant::now();
        let mut scheduler = PersistenceScheduler::new(DEBOUNCE);

        scheduler.request(WriteMode::Debounced, start);
        scheduler.request(WriteMode::Debounced, start + Duration::from_millis(600));

        assert!(!scheduler.take_due(start + Duration::from_millis(1200)));
        assert!(scheduler.take_due(start + Duration::from_millis(1600)));
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn immediate_replaces_pending_debounce() {
        let start = Instant::now();
        let mut scheduler = PersistenceScheduler::new(DEBOUNCE);

        scheduler.request(WriteMode::Debounced, start);
        scheduler.request(WriteMode::Immediate, start + Duration::from_millis(10));

        assert!(scheduler.take_due(start + Duration::from_millis(10)));
    }

    #[test]
    fn debounce_does_not_delay_pending_immediate() {
        let start = Instant::now();
        let mut scheduler = PersistenceScheduler::new(DEBOUNCE);

        scheduler.request(WriteMode::Immediate, start);
        scheduler.request(WriteMode::Debounced, start);

        assert_eq!(scheduler.deadline(), Some(start));
        assert!(scheduler.take_due(start));

        // Once fired, routine writes debounce again
        scheduler.request(WriteMode::Debounced, start);
        assert_eq!(scheduler.deadline(), Some(start + DEBOUNCE));
    }

    #[test]
    fn flush_takes_pending_write() {
        let mut scheduler = PersistenceScheduler::new(DEBOUNCE);
        assert!(!scheduler.flush());

        scheduler.request(WriteMode::Debounced, Instant::now());
        assert!(scheduler.flush());
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn persisted_queue_wire_format() {
        let json = serde_json::to_string(&PersistedQueue::default()).unwrap();
        assert_eq!(json, r#"{"items":[],"current":0}"#);
    }
}
