//! Polled position source - interval-driven poll loop over a pull provider.
//!
//! [`PolledSource`] wraps any [`FixProvider`] (a backend that can be asked
//! for its current fix) and drives it on a `tokio::time::interval` loop:
//! tick, fetch, stamp, send. Fetch failures are logged and the tick skipped;
//! the loop exits on cancellation or when the consumer goes away.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::PositionError;
use super::sample::PositionSample;
use super::source::{PositionSource, SourceHandle, Subscription, SAMPLE_CHANNEL_CAPACITY};

/// A raw position fix from a provider, before capture stamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Trait for backends that can be polled for their current position.
pub trait FixProvider: Send + Sync {
    /// Fetch the current fix.
    fn current_fix(&self) -> impl Future<Output = Result<PositionFix, PositionError>> + Send;
}

/// Position source that polls a [`FixProvider`] at a fixed interval.
pub struct PolledSource<P> {
    provider: Arc<P>,
}

impl<P: FixProvider + 'static> PolledSource<P> {
    /// Create a polled source around a provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

impl<P: FixProvider + 'static> PositionSource for PolledSource<P> {
    fn subscribe(&self, interval: Duration) -> Result<Subscription, PositionError> {
        let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let provider = Arc::clone(&self.provider);
        tokio::spawn(run_poll_loop(provider, interval, tx, cancel.clone()));

        Ok(Subscription {
            samples: rx,
            handle: SourceHandle::new(cancel),
        })
    }
}

/// The poll loop driving a provider.
async fn run_poll_loop<P: FixProvider>(
    provider: Arc<P>,
    interval: Duration,
    tx: mpsc::Sender<PositionSample>,
    cancel: CancellationToken,
) {
    info!(
        interval_ms = interval.as_millis() as u64,
        "Position poll loop started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut samples_sent: u64 = 0;
    let mut consecutive_errors: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Position poll loop cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        if tx.is_closed() {
            debug!("Sample channel closed, stopping poll loop");
            break;
        }

        match provider.current_fix().await {
            Ok(fix) => {
                consecutive_errors = 0;

                let sample = match PositionSample::new(fix.latitude, fix.longitude) {
                    Ok(sample) => sample,
                    Err(e) => {
                        warn!(error = %e, "Provider returned invalid fix, skipping");
                        continue;
                    }
                };

                match tx.try_send(sample) {
                    Ok(()) => samples_sent += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Sample channel full, dropping sample");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("Sample channel closed, stopping poll loop");
                        break;
                    }
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                // First failure at warn, repeats at debug to avoid log spam
                if consecutive_errors == 1 {
                    warn!(error = %e, "Failed to fetch position fix");
                } else {
                    debug!(error = %e, consecutive_errors, "Failed to fetch position fix");
                }
            }
        }
    }

    info!(samples_sent, "Position poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Provider that yields a fixed coordinate and counts calls.
    struct FixedProvider {
        fix: PositionFix,
        calls: AtomicU64,
    }

    impl FixedProvider {
        fn new(latitude: f64, longitude: f64) -> Self {
            Self {
                fix: PositionFix {
                    latitude,
                    longitude,
                },
                calls: AtomicU64::new(0),
            }
        }
    }

    impl FixProvider for FixedProvider {
        async fn current_fix(&self) -> Result<PositionFix, PositionError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.fix)
        }
    }

    /// Provider that always fails.
    struct FailingProvider;

    impl FixProvider for FailingProvider {
        async fn current_fix(&self) -> Result<PositionFix, PositionError> {
            Err(PositionError::FixUnavailable("no signal".to_string()))
        }
    }

    #[tokio::test]
    async fn test_polled_source_yields_samples() {
        let source = PolledSource::new(FixedProvider::new(53.63, 9.99));
        let mut subscription = source.subscribe(Duration::from_millis(10)).unwrap();

        let sample = subscription
            .samples
            .recv()
            .await
            .expect("Should yield a sample");
        assert!((sample.latitude - 53.63).abs() < 0.001);
        assert!((sample.longitude - 9.99).abs() < 0.001);

        subscription.handle.cancel();
    }

    #[tokio::test]
    async fn test_cancel_stops_producer() {
        let source = PolledSource::new(FixedProvider::new(1.0, 2.0));
        let mut subscription = source.subscribe(Duration::from_millis(5)).unwrap();

        // Receive at least one sample, then cancel
        subscription.samples.recv().await.unwrap();
        subscription.handle.cancel();

        // The channel must close once the producer drains
        while subscription.samples.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_fetch_errors_yield_no_samples() {
        let source = PolledSource::new(FailingProvider);
        let mut subscription = source.subscribe(Duration::from_millis(5)).unwrap();

        let recv = tokio::time::timeout(Duration::from_millis(50), subscription.samples.recv());
        assert!(recv.await.is_err(), "Failing provider should stay silent");

        subscription.handle.cancel();
    }

    #[tokio::test]
    async fn test_dropping_receiver_stops_producer() {
        let provider = Arc::new(FixedProvider::new(1.0, 2.0));
        let source = PolledSource {
            provider: Arc::clone(&provider),
        };
        let subscription = source.subscribe(Duration::from_millis(5)).unwrap();

        drop(subscription.samples);
        tokio::time::sleep(Duration::from_millis(30)).await;

        let calls_then = provider.calls.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(
            provider.calls.load(Ordering::Relaxed),
            calls_then,
            "Producer should stop polling after the consumer goes away"
        );
    }
}
