//! Tracker event bus - broadcast channel between the service and consumers.
//!
//! The tracking service publishes [`TrackerEvent`]s; any number of consumers
//! subscribe and receive events in publication order. There is no replay:
//! subscribers only see events published after they subscribed. Publishing
//! with no subscribers is not an error.

use tokio::sync::broadcast;

use crate::position::PositionSample;

/// Default capacity of the event channel per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events published by the tracking service.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// The service transitioned (or re-announced) its active state.
    StatusChanged { active: bool },

    /// A position sample was captured while active.
    SampleCaptured(PositionSample),
}

/// Broadcast bus for tracker events.
///
/// A slow subscriber that falls more than the channel capacity behind
/// observes `RecvError::Lagged` and continues from the oldest retained
/// event.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    /// Create a bus with the given per-subscriber capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: TrackerEvent) {
        // Send fails only when there are no subscribers, which is fine
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.tx.subscribe()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        bus.publish(TrackerEvent::StatusChanged { active: true });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(TrackerEvent::StatusChanged { active: true });
        let sample = PositionSample::new(1.0, 2.0).unwrap();
        bus.publish(TrackerEvent::SampleCaptured(sample.clone()));
        bus.publish(TrackerEvent::StatusChanged { active: false });

        assert!(matches!(
            rx.recv().await.unwrap(),
            TrackerEvent::StatusChanged { active: true }
        ));
        match rx.recv().await.unwrap() {
            TrackerEvent::SampleCaptured(received) => assert_eq!(received, sample),
            other => panic!("Expected SampleCaptured, got {:?}", other),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            TrackerEvent::StatusChanged { active: false }
        ));
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let bus = EventBus::default();
        bus.publish(TrackerEvent::StatusChanged { active: true });

        let mut rx = bus.subscribe();
        bus.publish(TrackerEvent::StatusChanged { active: false });

        // Only the event published after subscription is visible
        assert!(matches!(
            rx.recv().await.unwrap(),
            TrackerEvent::StatusChanged { active: false }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(TrackerEvent::StatusChanged { active: true });

        assert!(matches!(
            first.recv().await.unwrap(),
            TrackerEvent::StatusChanged { active: true }
        ));
        assert!(matches!(
            second.recv().await.unwrap(),
            TrackerEvent::StatusChanged { active: true }
        ));
    }
}
