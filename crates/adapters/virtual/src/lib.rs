//! # roomjoin-adapter-virtual
//!
//! Virtual adapter providing an in-memory venue for testing and
//! demonstration purposes.
//!
//! ## Provided components
//!
//! | Component | Port | Behaviour |
//! |-----------|------|-----------|
//! | [`InMemoryRoomRegistry`] | `RoomRegistry` | Rooms in a mutex-guarded map |
//! | [`VirtualPartitionControl`] | `PartitionControl` | Opens/closes on command, notifies on change |
//! | [`InMemoryControlDirectory`] | `ControlDirectory` | Resolves controls by id |
//!
//! ## Dependency rule
//!
//! Depends on `roomjoin-app` (port traits) and `roomjoin-domain` only.

pub mod control;
pub mod directory;
pub mod error;
pub mod registry;

pub use control::VirtualPartitionControl;
pub use directory::InMemoryControlDirectory;
pub use error::VirtualError;
pub use registry::InMemoryRoomRegistry;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use roomjoin_app::event_bus::InProcessEventBus;
    use roomjoin_app::partition_manager::PartitionManager;
    use roomjoin_app::ports::room_factory;
    use roomjoin_app::ports::{PartitionControl, RoomRegistry};
    use roomjoin_domain::partition::{Partition, PartitionFeedback};
    use roomjoin_domain::room::Room;

    #[test]
    fn should_drive_manager_through_virtual_controls() {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let directory = Arc::new(InMemoryControlDirectory::new());
        let (a, b) = (
            Room::builder().name("A").build().unwrap(),
            Room::builder().name("B").build().unwrap(),
        );
        let (a_id, b_id) = (a.id, b.id);
        registry.add_room(a).unwrap();
        registry.add_room(b).unwrap();
        let wall = Arc::new(VirtualPartitionControl::new("A|B"));
        directory.insert(Arc::clone(&wall));

        let manager = PartitionManager::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
            Arc::new(InProcessEventBus::new(16)),
        );
        let partition = Partition::builder()
            .name("A|B")
            .between(a_id, b_id)
            .control(wall.id(), PartitionFeedback::GET_SET)
            .build()
            .unwrap();
        let pid = partition.id;
        manager.add_partition(partition).unwrap();
        assert_eq!(wall.subscriber_count(), 1);

        wall.set_physical(true);
        let combined = manager.get_combine_room(pid).unwrap();
        assert_eq!(combined.rooms, BTreeSet::from([a_id, b_id]));

        manager.uncombine_rooms(pid, &room_factory::named("unused"));
        assert!(!wall.is_open().unwrap());
        assert_eq!(registry.len(), 2);
    }
}
