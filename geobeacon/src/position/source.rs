//! Position source trait and subscription types.
//!
//! A [`PositionSource`] produces periodic [`PositionSample`]s once subscribed.
//! Subscribing spawns a producer task that feeds samples into a channel; the
//! returned [`Subscription`] carries the consumer end plus a [`SourceHandle`]
//! that stops the producer.
//!
//! After [`SourceHandle::cancel`] returns and the producer winds down, no new
//! samples are produced; samples already queued in the channel may still be
//! drained by the consumer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::PositionError;
use super::sample::PositionSample;

/// Capacity of the sample channel between a producer and its consumer.
pub(crate) const SAMPLE_CHANNEL_CAPACITY: usize = 16;

/// Trait for sources of periodic position samples.
///
/// `interval` is a best-effort cadence: polled sources tick at the interval,
/// push-driven sources (UDP forwarders) use it as a minimum spacing between
/// emitted samples. Platform jitter and suppression are expected.
///
/// `subscribe` must be called from within a Tokio runtime (it spawns the
/// producer task) and may fail synchronously when the underlying capability
/// is unavailable.
pub trait PositionSource: Send + Sync {
    /// Start producing samples at approximately `interval` cadence.
    fn subscribe(&self, interval: Duration) -> Result<Subscription, PositionError>;
}

/// Handle to an active position subscription.
///
/// Cancelling (or dropping) the handle stops the producer task.
#[derive(Debug)]
pub struct SourceHandle {
    cancel: CancellationToken,
}

impl SourceHandle {
    /// Create a handle around a producer's cancellation token.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Stop the producer. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the producer has been told to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// An active position subscription: the sample stream plus its stop handle.
pub struct Subscription {
    /// Consumer end of the sample channel. Closed when the producer stops.
    pub samples: mpsc::Receiver<PositionSample>,

    /// Handle that stops the producer.
    pub handle: SourceHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_cancel_is_idempotent() {
        let token = CancellationToken::new();
        let handle = SourceHandle::new(token.clone());

        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_handle_drop_cancels() {
        let token = CancellationToken::new();
        {
            let _handle = SourceHandle::new(token.clone());
        }
        assert!(token.is_cancelled());
    }
}
