//! Event — an immutable record of something the combination engine did.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, PartitionId, RoomId};
use crate::time::{Timestamp, now};

/// Kind of [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A composite room was created.
    RoomsCombined,
    /// A composite room was destroyed.
    RoomsUncombined,
    /// A partition group could not be combined.
    CombineFailed,
    /// A partition control reported a new open status.
    PartitionStatusChanged,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomsCombined => f.write_str("rooms_combined"),
            Self::RoomsUncombined => f.write_str("rooms_uncombined"),
            Self::CombineFailed => f.write_str("combine_failed"),
            Self::PartitionStatusChanged => f.write_str("partition_status_changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub room_id: Option<RoomId>,
    pub partition_id: Option<PartitionId>,
    pub timestamp: Timestamp,
    pub data: serde_json::Value,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, room_id: Option<RoomId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            room_id,
            partition_id: None,
            timestamp: now(),
            data,
        }
    }

    #[must_use]
    pub fn with_partition(mut self, partition_id: PartitionId) -> Self {
        self.partition_id = Some(partition_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_new_event_with_fresh_id() {
        let a = Event::new(EventType::RoomsCombined, None, serde_json::json!({}));
        let b = Event::new(EventType::RoomsCombined, None, serde_json::json!({}));
        assert_ne!(a.id, b.id);
        assert!(a.partition_id.is_none());
    }

    #[test]
    fn should_attach_partition() {
        let partition = PartitionId::new();
        let event = Event::new(
            EventType::PartitionStatusChanged,
            None,
            serde_json::json!({}),
        )
        .with_partition(partition);
        assert_eq!(event.partition_id, Some(partition));
    }

    #[test]
    fn should_serialize_event_type_in_snake_case() {
        let json = serde_json::to_string(&EventType::RoomsUncombined).unwrap();
        assert_eq!(json, r#""rooms_uncombined""#);
        assert_eq!(EventType::CombineFailed.to_string(), "combine_failed");
    }
}
