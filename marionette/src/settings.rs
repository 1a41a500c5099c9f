//! Per-robot configuration, immutable after construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How simulated input reaches component listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMode {
    /// Post events through the event loop queue, like OS-level injection.
    Queued,
    /// Invoke component listeners inline on the event loop thread.
    Direct,
}

/// Configuration snapshot shared by one [`Robot`](crate::Robot) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Pacing delay between simulated low-level events, in milliseconds.
    pub auto_delay_ms: u64,
    /// Default wait duration for settle/poll calls, in milliseconds.
    pub timeout_ms: u64,
    pub event_mode: EventMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_delay_ms: 0,
            timeout_ms: 5_000,
            event_mode: EventMode::Queued,
        }
    }
}

impl Settings {
    pub fn with_auto_delay(mut self, delay: Duration) -> Self {
        self.auto_delay_ms = saturating_millis(delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = saturating_millis(timeout);
        self
    }

    pub fn with_event_mode(mut self, event_mode: EventMode) -> Self {
        self.event_mode = event_mode;
        self
    }

    pub fn auto_delay(&self) -> Duration {
        Duration::from_millis(self.auto_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Durations past `u64::MAX` milliseconds clamp rather than truncate.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
