//! Observer-facing progress rate limit
//!
//! Only gates what observers see; internal consumers read the renderer
//! position directly.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between progress emissions
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    /// Create a throttle (250 ms gives ~4 Hz)
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    /// Returns `true` (and records the emission) if enough time has passed
    pub fn should_emit(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

    /// Let the next call through
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}
