//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::event::Event;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> Result<(), RoomJoinError> {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomjoin_domain::event::EventType;
    use roomjoin_domain::id::{PartitionId, RoomId};
    use tokio::sync::broadcast::error::RecvError;

    fn combined(rooms: &[RoomId]) -> Event {
        Event::new(
            EventType::RoomsCombined,
            Some(RoomId::new()),
            serde_json::json!({ "name": "Ballroom", "rooms": rooms }),
        )
    }

    #[tokio::test]
    async fn should_deliver_combine_event_with_member_rooms() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let rooms = [RoomId::new(), RoomId::new()];

        bus.publish(combined(&rooms)).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, EventType::RoomsCombined);
        let members = received.data["rooms"].clone();
        let members: Vec<RoomId> = serde_json::from_value(members).unwrap();
        assert_eq!(members, rooms);
    }

    #[tokio::test]
    async fn should_fan_out_partition_status_to_every_listener() {
        let bus = InProcessEventBus::new(16);
        let mut log = bus.subscribe();
        let mut panel = bus.subscribe();
        let partition = PartitionId::new();

        let status = Event::new(
            EventType::PartitionStatusChanged,
            None,
            serde_json::json!({ "open": true }),
        )
        .with_partition(partition);
        bus.publish(status).unwrap();

        assert_eq!(log.recv().await.unwrap().partition_id, Some(partition));
        assert_eq!(panel.recv().await.unwrap().partition_id, Some(partition));
    }

    #[test]
    fn should_accept_events_while_nobody_listens() {
        let bus = InProcessEventBus::new(16);
        let failure = Event::new(EventType::CombineFailed, None, serde_json::json!({}));
        assert!(bus.publish(failure).is_ok());
    }

    #[tokio::test]
    async fn should_report_lag_when_listener_falls_behind() {
        let bus = InProcessEventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(combined(&[])).unwrap();
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert!(rx.recv().await.is_ok());
    }
}
