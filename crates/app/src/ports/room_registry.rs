//! Room registry port — the shared set of rooms of a venue.
//!
//! Simple rooms are added by settings. Composite rooms are added and removed
//! exclusively by the [`PartitionManager`](crate::partition_manager::PartitionManager).

use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::id::RoomId;
use roomjoin_domain::room::Room;

/// Registry of every room known to the venue.
pub trait RoomRegistry: Send + Sync {
    /// Register a room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Registry`] when a room with the same id is
    /// already present or the backing store rejects it.
    fn add_room(&self, room: Room) -> Result<(), RoomJoinError>;

    /// Remove a room, returning it when it was present.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Registry`] when the backing store fails.
    fn remove_room(&self, id: RoomId) -> Result<Option<Room>, RoomJoinError>;

    /// Replace a registered room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::NotFound`] when no room with `room.id` exists.
    fn update_room(&self, room: Room) -> Result<(), RoomJoinError>;

    /// Look up a room by id.
    fn get_room(&self, id: RoomId) -> Option<Room>;

    /// Snapshot of all rooms.
    fn rooms(&self) -> Vec<Room>;
}

impl<T: RoomRegistry> RoomRegistry for std::sync::Arc<T> {
    fn add_room(&self, room: Room) -> Result<(), RoomJoinError> {
        (**self).add_room(room)
    }

    fn remove_room(&self, id: RoomId) -> Result<Option<Room>, RoomJoinError> {
        (**self).remove_room(id)
    }

    fn update_room(&self, room: Room) -> Result<(), RoomJoinError> {
        (**self).update_room(room)
    }

    fn get_room(&self, id: RoomId) -> Option<Room> {
        (**self).get_room(id)
    }

    fn rooms(&self) -> Vec<Room> {
        (**self).rooms()
    }
}
