//! Error recovery policy
//!
//! retry once, then skip, then stop after repeated consecutive failures.
//! A successful "playing" clears both counters. Moving to another track
//! clears only the retry counter, so failures on distinct tracks add up.

use std::time::Duration;
use tracing::{debug, warn};

/// What to do after a playback failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Reload the same track after `delay`
    Retry {
        /// Wait before reloading
        delay: Duration,
    },
    /// Give up on this track and move on
    Skip,
    /// Give up on playback entirely
    Stop,
}

/// Failure counters and thresholds
#[derive(Debug, Clone)]
pub struct ErrorRecoveryPolicy {
    max_retries: u32,
    max_consecutive_failures: u32,
    retry_delay: Duration,
    retry_count: u32,
    consecutive_failures: u32,
}

impl ErrorRecoveryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, max_consecutive_failures: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            max_consecutive_failures,
            retry_delay,
            retry_count: 0,
            consecutive_failures: 0,
        }
    }

    /// Record a failure and decide
    pub fn on_error(&mut self) -> RecoveryAction {
        if self.retry_count < self.max_retries {
            self.retry_count += 1;
            debug!(attempt = self.retry_count, "Retrying track");
            return RecoveryAction::Retry {
                delay: self.retry_delay,
            };
        }

        self.retry_count = 0;
        self.consecutive_failures += 1;

        if self.consecutive_failures >= self.max_consecutive_failures {
            warn!(
                failures = self.consecutive_failures,
                "Too many consecutive failures"
            );
            RecoveryAction::Stop
        } else {
            RecoveryAction::Skip
        }
    }

    /// Playback started successfully
    pub fn on_playing(&mut self) {
        self.retry_count = 0;
        self.consecutive_failures = 0;
    }

    /// Cursor moved to another track
    pub fn on_track_changed(&mut self) {
        self.retry_count = 0;
    }

    /// Forget everything (explicit user restart)
    pub fn reset(&mut self) {
        self.on_playing();
    }

    /// Retries spent on the current track
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Failed tracks in a row
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl Default for ErrorRecoveryPolicy {
    fn default() -> Self {
        Self::new(1, 3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_once_then_skip() {
        let mut policy = ErrorRecoveryPolicy::default();
        assert_eq!(
            policy.on_error(),
            RecoveryAction::Retry {
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(policy.on_error(), RecoveryAction::Skip);
        assert_eq!(policy.retry_count(), 0);
        assert_eq!(policy.consecutive_failures(), 1);
    }

    #[test]
    fn stops_after_three_failed_tracks() {
        let mut policy = ErrorRecoveryPolicy::default();
        let mut actions = Vec::new();
        for _ in 0..3 {
            policy.on_track_changed();
            actions.push(policy.on_error());
            actions.push(policy.on_error());
        }
        assert_eq!(actions.last(), Some(&RecoveryAction::Stop));
        assert_eq!(
            actions.iter().filter(|a| **a == RecoveryAction::Skip).count(),
            2
        );
    }

    #[test]
    fn playing_resets_both_counters() {
        let mut policy = ErrorRecoveryPolicy::default();
        policy.on_error();
        policy.on_error();
        policy.on_error();
        policy.on_playing();

        assert_eq!(policy.retry_count(), 0);
        assert_eq!(policy.consecutive_failures(), 0);
    }

    #[test]
    fn track_change_keeps_consecutive_failures() {
        let mut policy = ErrorRecoveryPolicy::default();
        policy.on_error();
        policy.on_error();
        policy.on_track_changed();
        assert_eq!(policy.consecutive_failures(), 1);
    }

    #[test]
    fn zero_retries_skips_immediately() {
        let mut policy = ErrorRecoveryPolicy::new(0, 3, Duration::ZERO);
        assert_eq!(policy.on_error(), RecoveryAction::Skip);
    }
}
