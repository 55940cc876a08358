// Status data reported to the status collaborator
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub valid_variables: usize,
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub ticks_per_second: Option<u32>,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            valid_variables: 0,
            connected: false,
            latency_ms: None,
            ticks_per_second: None,
            message: None,
            updated_at: Utc::now(),
        }
    }
}

/// Counts completed ticks and publishes the count once per elapsed second.
#[derive(Debug, Clone)]
pub struct TickRateMeter {
    count: u32,
    window_start: Instant,
}

impl TickRateMeter {
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Returns the effective rate when a full window has elapsed.
    pub fn record(&mut self, now: Instant) -> Option<u32> {
        self.count += 1;
        if now.duration_since(self.window_start) >= RATE_WINDOW {
            let rate = self.count;
            self.count = 0;
            self.window_start = now;
            Some(rate)
        } else {
            None
        }
    }
}
