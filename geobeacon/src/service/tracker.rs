//! Location tracker - lifecycle owner and control surface.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::config::TrackerConfig;
use super::error::ServiceError;
use crate::events::{EventBus, TrackerEvent};
use crate::position::{PositionSample, PositionSource, SourceHandle, Subscription};
use crate::relay::{
    CollectorClient, CollectorConfig, DeliveryRelay, HttpCollectorClient, RelayStatsSnapshot,
};

/// Lifecycle state of the tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Not sampling; no source subscription exists.
    Inactive,

    /// Sampling; exactly one source subscription exists.
    Active,
}

/// Interior state mutated only by `start` / `stop`.
struct TrackerInner {
    state: TrackerState,
    sampling: Option<SourceHandle>,
}

/// The tracking service facade.
///
/// Owns the on/off lifecycle of position sampling. While active, every
/// sample from the source is published as a [`TrackerEvent::SampleCaptured`]
/// and handed to the delivery relay with the token current at that moment.
///
/// `start` and `stop` mutate state synchronously; event delivery to
/// subscribers is asynchronous. Callers should serialize `start`/`stop`
/// invocations; the internal mutex makes interleaved calls safe but their
/// relative order is then unspecified.
///
/// # Example
///
/// ```ignore
/// use geobeacon::position::UdpGpsSource;
/// use geobeacon::relay::CollectorConfig;
/// use geobeacon::service::{LocationTracker, TrackerConfig};
///
/// let tracker = LocationTracker::with_http_collector(
///     TrackerConfig::default(),
///     Arc::new(UdpGpsSource::default()),
///     &CollectorConfig::new("https://collector.example/points"),
/// )?;
///
/// let mut events = tracker.subscribe();
/// tracker.start(Some("abc123".to_string()))?;
/// // ... consume events ...
/// tracker.stop();
/// ```
pub struct LocationTracker<C: CollectorClient + 'static> {
    config: TrackerConfig,
    source: Arc<dyn PositionSource>,
    relay: DeliveryRelay<C>,
    events: EventBus,
    token: Arc<RwLock<Option<String>>>,
    inner: Mutex<TrackerInner>,
}

impl<C: CollectorClient + 'static> LocationTracker<C> {
    /// Create a tracker from its collaborators.
    pub fn new(config: TrackerConfig, source: Arc<dyn PositionSource>, client: C) -> Self {
        let events = EventBus::new(config.event_capacity());
        Self {
            config,
            source,
            relay: DeliveryRelay::new(client),
            events,
            token: Arc::new(RwLock::new(None)),
            inner: Mutex::new(TrackerInner {
                state: TrackerState::Inactive,
                sampling: None,
            }),
        }
    }

    /// Start position sampling.
    ///
    /// Stores `token` and subscribes to the position source. When already
    /// active this is idempotent on the subscription: the token is updated
    /// and the active status re-announced, nothing else changes.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceSubscribe`] when the source cannot be
    /// subscribed to. The service stays inactive and no status event is
    /// published.
    pub fn start(&self, token: Option<String>) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.state == TrackerState::Active {
            *self.token.write().unwrap() = token;
            debug!("Tracker already active, re-announcing status");
            self.events.publish(TrackerEvent::StatusChanged { active: true });
            return Ok(());
        }

        let Subscription { samples, handle } =
            self.source.subscribe(self.config.sample_interval())?;

        *self.token.write().unwrap() = token;
        self.spawn_sample_worker(samples);

        inner.sampling = Some(handle);
        inner.state = TrackerState::Active;

        info!(
            interval_ms = self.config.sample_interval().as_millis() as u64,
            "Tracking started"
        );
        self.events.publish(TrackerEvent::StatusChanged { active: true });

        Ok(())
    }

    /// Stop position sampling.
    ///
    /// Unconditional: cancels the source subscription (a no-op when there is
    /// none), clears the token, and announces the inactive status - also
    /// when already inactive. Samples the source queued before cancellation
    /// are still handled once; in-flight delivery tasks run to completion.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();

        if let Some(handle) = inner.sampling.take() {
            handle.cancel();
            info!("Tracking stopped");
        }

        inner.state = TrackerState::Inactive;
        *self.token.write().unwrap() = None;
        self.events.publish(TrackerEvent::StatusChanged { active: false });
    }

    /// Whether the service is currently sampling.
    pub fn is_active(&self) -> bool {
        self.state() == TrackerState::Active
    }

    /// The current lifecycle state.
    pub fn state(&self) -> TrackerState {
        self.inner.lock().unwrap().state
    }

    /// Subscribe to status and sample events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Delivery counters for diagnostics.
    pub fn relay_stats(&self) -> RelayStatsSnapshot {
        self.relay.stats()
    }

    /// The service configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Per-sample handler: publish first, then hand off to the relay with a
    /// token snapshot taken at dispatch scheduling time.
    fn spawn_sample_worker(&self, mut samples: mpsc::Receiver<PositionSample>) {
        let events = self.events.clone();
        let relay = self.relay.clone();
        let token = Arc::clone(&self.token);

        tokio::spawn(async move {
            while let Some(sample) = samples.recv().await {
                let token_snapshot = token.read().unwrap().clone();
                events.publish(TrackerEvent::SampleCaptured(sample.clone()));
                relay.dispatch(&sample, token_snapshot);
            }
            debug!("Sample worker stopped (source channel closed)");
        });
    }
}

impl LocationTracker<HttpCollectorClient> {
    /// Create a tracker that delivers to an HTTP collector endpoint.
    pub fn with_http_collector(
        config: TrackerConfig,
        source: Arc<dyn PositionSource>,
        collector: &CollectorConfig,
    ) -> Result<Self, ServiceError> {
        let client = HttpCollectorClient::new(collector)?;
        Ok(Self::new(config, source, client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionError;
    use crate::relay::{CollectorError, LocationReport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Source whose samples are pushed manually by the test.
    struct ManualSource {
        fail: bool,
        subscriptions: AtomicUsize,
        feed: Mutex<Option<(mpsc::Sender<PositionSample>, CancellationToken)>>,
    }

    impl ManualSource {
        fn new() -> Self {
            Self {
                fail: false,
                subscriptions: AtomicUsize::new(0),
                feed: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                subscriptions: AtomicUsize::new(0),
                feed: Mutex::new(None),
            }
        }

        /// Push a sample, honoring the contract that a source never yields
        /// after unsubscribe.
        fn push(&self, sample: PositionSample) -> bool {
            let mut feed = self.feed.lock().unwrap();
            match feed.as_ref() {
                Some((_, cancel)) if cancel.is_cancelled() => {
                    *feed = None;
                    false
                }
                Some((tx, _)) => tx.try_send(sample).is_ok(),
                None => false,
            }
        }

        fn subscription_count(&self) -> usize {
            self.subscriptions.load(Ordering::Relaxed)
        }
    }

    impl PositionSource for ManualSource {
        fn subscribe(&self, _interval: Duration) -> Result<Subscription, PositionError> {
            if self.fail {
                return Err(PositionError::Unavailable("capability denied".to_string()));
            }

            let (tx, rx) = mpsc::channel(16);
            let cancel = CancellationToken::new();
            *self.feed.lock().unwrap() = Some((tx, cancel.clone()));
            self.subscriptions.fetch_add(1, Ordering::Relaxed);

            Ok(Subscription {
                samples: rx,
                handle: SourceHandle::new(cancel),
            })
        }
    }

    /// Collector client that accepts everything.
    struct NullClient;

    impl CollectorClient for NullClient {
        async fn deliver(&self, _report: &LocationReport) -> Result<(), CollectorError> {
            Ok(())
        }
    }

    fn make_tracker(source: Arc<ManualSource>) -> LocationTracker<NullClient> {
        LocationTracker::new(TrackerConfig::default(), source, NullClient)
    }

    async fn next_event(rx: &mut broadcast::Receiver<TrackerEvent>) -> TrackerEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Event should arrive within timeout")
            .expect("Event channel should be open")
    }

    #[tokio::test]
    async fn test_initial_state_is_inactive() {
        let tracker = make_tracker(Arc::new(ManualSource::new()));
        assert!(!tracker.is_active());
        assert_eq!(tracker.state(), TrackerState::Inactive);
    }

    #[tokio::test]
    async fn test_start_transitions_and_announces() {
        let tracker = make_tracker(Arc::new(ManualSource::new()));
        let mut rx = tracker.subscribe();

        tracker.start(Some("tok-1".to_string())).unwrap();

        assert!(tracker.is_active());
        assert!(matches!(
            next_event(&mut rx).await,
            TrackerEvent::StatusChanged { active: true }
        ));
    }

    #[tokio::test]
    async fn test_double_start_reuses_subscription() {
        let source = Arc::new(ManualSource::new());
        let tracker = make_tracker(Arc::clone(&source));
        let mut rx = tracker.subscribe();

        tracker.start(Some("tok-1".to_string())).unwrap();
        tracker.start(Some("tok-2".to_string())).unwrap();

        // Two announcements, one subscription
        assert!(matches!(
            next_event(&mut rx).await,
            TrackerEvent::StatusChanged { active: true }
        ));
        assert!(matches!(
            next_event(&mut rx).await,
            TrackerEvent::StatusChanged { active: true }
        ));
        assert_eq!(source.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_subscribe_stays_inactive_and_silent() {
        let tracker = make_tracker(Arc::new(ManualSource::failing()));
        let mut rx = tracker.subscribe();

        let result = tracker.start(Some("tok-1".to_string()));
        assert!(matches!(result, Err(ServiceError::SourceSubscribe(_))));
        assert!(!tracker.is_active());

        // No status event on failure
        let recv = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(recv.is_err(), "Failed start must publish no event");
    }

    #[tokio::test]
    async fn test_stop_while_inactive_still_announces() {
        let tracker = make_tracker(Arc::new(ManualSource::new()));
        let mut rx = tracker.subscribe();

        tracker.stop();

        assert!(!tracker.is_active());
        assert!(matches!(
            next_event(&mut rx).await,
            TrackerEvent::StatusChanged { active: false }
        ));
    }

    #[tokio::test]
    async fn test_sample_published_and_counted() {
        let source = Arc::new(ManualSource::new());
        let tracker = make_tracker(Arc::clone(&source));
        let mut rx = tracker.subscribe();

        tracker.start(None).unwrap();
        next_event(&mut rx).await; // StatusChanged(true)

        let sample = PositionSample::new(1.0, 2.0).unwrap();
        assert!(source.push(sample.clone()));

        match next_event(&mut rx).await {
            TrackerEvent::SampleCaptured(received) => assert_eq!(received, sample),
            other => panic!("Expected SampleCaptured, got {:?}", other),
        }

        // The relay saw exactly one dispatch
        for _ in 0..100 {
            if tracker.relay_stats().dispatched == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(tracker.relay_stats().dispatched, 1);
    }

    #[tokio::test]
    async fn test_source_respects_cancel_after_stop() {
        let source = Arc::new(ManualSource::new());
        let tracker = make_tracker(Arc::clone(&source));
        let mut rx = tracker.subscribe();

        tracker.start(None).unwrap();
        next_event(&mut rx).await; // StatusChanged(true)

        tracker.stop();
        assert!(matches!(
            next_event(&mut rx).await,
            TrackerEvent::StatusChanged { active: false }
        ));

        // The source contract: no yields after unsubscribe
        let sample = PositionSample::new(3.0, 4.0).unwrap();
        assert!(!source.push(sample));

        let recv = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(recv.is_err(), "No sample events after stop");
    }
}
