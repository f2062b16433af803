//! Fire-and-forget delivery relay.
//!
//! [`DeliveryRelay::dispatch`] spawns one detached task per sample: a single
//! collector request, no retry, no buffering, no backpressure to the caller.
//! A failed delivery is logged and counted, then the report is dropped - a
//! dropped sample is less harmful than stalling position capture.

use std::sync::Arc;

use tracing::{debug, warn};

use super::client::{CollectorClient, LocationReport};
use super::stats::{RelayStats, RelayStatsSnapshot};
use crate::position::PositionSample;

/// Relay that forwards captured samples to the collector.
pub struct DeliveryRelay<C> {
    client: Arc<C>,
    stats: Arc<RelayStats>,
}

impl<C> Clone for DeliveryRelay<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<C: CollectorClient + 'static> DeliveryRelay<C> {
    /// Create a relay around a collector client.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            stats: Arc::new(RelayStats::new()),
        }
    }

    /// Forward one sample to the collector, tagged with the token current at
    /// capture time.
    ///
    /// Returns as soon as the delivery task is spawned. Must be called from
    /// within a Tokio runtime. The task runs to completion even if the
    /// tracking service stops in the meantime.
    pub fn dispatch(&self, sample: &PositionSample, token: Option<String>) {
        let report = LocationReport::from_sample(sample, token);
        let client = Arc::clone(&self.client);
        let stats = Arc::clone(&self.stats);

        stats.record_dispatched();

        tokio::spawn(async move {
            match client.deliver(&report).await {
                Ok(()) => {
                    stats.record_delivered();
                    debug!(
                        lat = format!("{:.4}", report.latitude),
                        lon = format!("{:.4}", report.longitude),
                        "Sample delivered to collector"
                    );
                }
                Err(e) => {
                    stats.record_failed();
                    warn!(
                        lat = format!("{:.4}", report.latitude),
                        lon = format!("{:.4}", report.longitude),
                        error = %e,
                        "Delivery failed, dropping sample"
                    );
                }
            }
        });
    }

    /// Read the delivery counters.
    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::client::CollectorError;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Client that records delivered reports.
    #[derive(Default)]
    struct RecordingClient {
        reports: Mutex<Vec<LocationReport>>,
    }

    impl CollectorClient for Arc<RecordingClient> {
        async fn deliver(&self, report: &LocationReport) -> Result<(), CollectorError> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    /// Client that always fails.
    struct FailingClient;

    impl CollectorClient for FailingClient {
        async fn deliver(&self, _report: &LocationReport) -> Result<(), CollectorError> {
            Err(CollectorError::Transport("connection refused".to_string()))
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Condition not met within timeout");
    }

    #[tokio::test]
    async fn test_dispatch_delivers_once() {
        let recording = Arc::new(RecordingClient::default());
        let relay = DeliveryRelay::new(Arc::clone(&recording));

        let sample = PositionSample::new(1.0, 2.0).unwrap();
        relay.dispatch(&sample, Some("tok-1".to_string()));

        wait_for(|| relay.stats().delivered == 1).await;

        let reports = recording.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].token.as_deref(), Some("tok-1"));
        assert!((reports[0].latitude - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_failure_counted_and_dropped() {
        let relay = DeliveryRelay::new(FailingClient);

        let sample = PositionSample::new(1.0, 2.0).unwrap();
        relay.dispatch(&sample, None);

        wait_for(|| relay.stats().failed == 1).await;

        let snapshot = relay.stats();
        assert_eq!(snapshot.dispatched, 1);
        assert_eq!(snapshot.delivered, 0);
        assert_eq!(snapshot.failed, 1);
    }
}
