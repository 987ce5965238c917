//! Broadcast fan-out for task lifecycle events

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::EventEnvelope;

/// Broadcast channel capacity; a subscriber lagging further than this starts
/// losing events.
const DEFAULT_CAPACITY: usize = 1000;

/// Fan-out hub for lifecycle events. Cloning is cheap; every clone publishes
/// into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    published: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deliver an envelope to every live subscriber and return how many
    /// received it. Without subscribers the event is counted, then dropped.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Firehose subscription over all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Subscription narrowed to one task. Events carrying a different task
    /// id, or none at all, are skipped on receive.
    pub fn subscribe_task(&self, task_id: Uuid) -> TaskEvents {
        TaskEvents {
            receiver: self.sender.subscribe(),
            task_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since construction.
    pub fn event_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("event_count", &self.event_count())
            .finish()
    }
}

/// Receiver half of [`EventBus::subscribe_task`].
pub struct TaskEvents {
    receiver: broadcast::Receiver<EventEnvelope>,
    task_id: Uuid,
}

impl TaskEvents {
    /// Next event for the subscribed task, discarding everything else.
    pub async fn recv(&mut self) -> Result<EventEnvelope, broadcast::error::RecvError> {
        loop {
            let envelope = self.receiver.recv().await?;
            if envelope.event.task_id() == Some(self.task_id) {
                return Ok(envelope);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Result<EventEnvelope, broadcast::error::TryRecvError> {
        loop {
            let envelope = self.receiver.try_recv()?;
            if envelope.event.task_id() == Some(self.task_id) {
                return Ok(envelope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use uuid::Uuid;

    fn created(task_id: Uuid) -> EventEnvelope {
        EventEnvelope::new(Event::TaskCreated {
            task_id,
            input_kind: "image".to_string(),
        })
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let envelope = created(Uuid::new_v4());

        let sent = bus.publish(envelope.clone());
        assert_eq!(sent, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, envelope.id);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let envelope = created(Uuid::new_v4());
        let envelope_id = envelope.id;

        let sent = bus.publish(envelope);
        assert_eq!(sent, 2);

        let received1 = rx1.recv().await.unwrap();
        let received2 = rx2.recv().await.unwrap();

        assert_eq!(received1.id, envelope_id);
        assert_eq!(received2.id, envelope_id);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new();

        // No subscribers, event is dropped
        let sent = bus.publish(created(Uuid::new_v4()));
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_event_count() {
        let bus = EventBus::new();
        assert_eq!(bus.event_count(), 0);

        bus.publish(created(Uuid::new_v4()));
        assert_eq!(bus.event_count(), 1);

        bus.publish(created(Uuid::new_v4()));
        assert_eq!(bus.event_count(), 2);
    }

    #[tokio::test]
    async fn test_task_subscription_filters_other_tasks() {
        let bus = EventBus::new();
        let watched = Uuid::new_v4();
        let mut rx = bus.subscribe_task(watched);

        bus.publish(created(Uuid::new_v4()));
        bus.publish(EventEnvelope::new(Event::Error {
            message: "transient".to_string(),
            context: None,
        }));
        let expected = created(watched);
        bus.publish(expected.clone());

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, expected.id);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clone() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus2.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
