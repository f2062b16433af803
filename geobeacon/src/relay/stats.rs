//! Atomic delivery counters.
//!
//! Relaxed ordering throughout - the counters are independent measurements
//! and never coordinate control flow.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for delivery attempts.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Reports handed to the relay.
    dispatched: AtomicU64,

    /// Reports the collector accepted.
    delivered: AtomicU64,

    /// Reports dropped after a failed attempt.
    failed: AtomicU64,
}

/// Point-in-time view of the relay counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl RelayStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report being dispatched.
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delivery.
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed (and dropped) delivery.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
