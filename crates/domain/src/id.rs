//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Room`](crate::room::Room).
    RoomId
);

define_id!(
    /// Unique identifier for a [`Partition`](crate::partition::Partition).
    PartitionId
);

define_id!(
    /// Identity of a hardware partition control.
    ControlId
);

define_id!(
    /// Opaque reference to a child resource (device, source, …) of a room.
    ResourceId
);

define_id!(
    /// Unique identifier for an [`Event`](crate::event::Event).
    EventId
);

define_id!(
    /// Handle returned when subscribing to a partition control.
    SubscriptionId
);

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn should_count_a_room_once_in_a_membership_set() {
        let (a, b) = (RoomId::new(), RoomId::new());
        let members: BTreeSet<RoomId> = [a, b, a].into_iter().collect();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn should_parse_control_id_back_from_its_log_form() {
        let control = ControlId::new();
        let parsed: ControlId = control.to_string().parse().unwrap();
        assert_eq!(parsed, control);
    }

    #[test]
    fn should_reject_malformed_partition_id() {
        assert!(PartitionId::from_str("wall-3").is_err());
    }

    #[test]
    fn should_serialize_as_bare_uuid_in_event_payloads() {
        let partition = PartitionId::new();
        let value = serde_json::to_value(partition).unwrap();
        assert_eq!(value, serde_json::Value::String(partition.to_string()));
    }

    #[test]
    fn should_break_priority_ties_by_room_id() {
        let low = RoomId::from_uuid(uuid::Uuid::from_u128(1));
        let high = RoomId::from_uuid(uuid::Uuid::from_u128(2));
        let master = [(0, high), (0, low)].into_iter().min().map(|(_, id)| id);
        assert_eq!(master, Some(low));
    }
}
