//! Tracking service configuration.

use std::time::Duration;

use crate::events::DEFAULT_EVENT_CAPACITY;

/// Default sampling interval (2 seconds).
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 2000;

/// Configuration for the tracking service.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Cadence requested from the position source.
    sample_interval: Duration,

    /// Per-subscriber event channel capacity.
    event_capacity: usize,
}

impl TrackerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the sampling interval.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Override the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// The sampling interval.
    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    /// The event channel capacity.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
