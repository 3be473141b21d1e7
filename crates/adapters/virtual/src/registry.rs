//! In-memory room registry.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use roomjoin_app::ports::RoomRegistry;
use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::id::RoomId;
use roomjoin_domain::room::Room;

use crate::error::VirtualError;

/// Rooms kept in a map behind a mutex. Snapshots are ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryRoomRegistry {
    rooms: Mutex<BTreeMap<RoomId, Room>>,
}

impl InMemoryRoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<RoomId, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoomRegistry for InMemoryRoomRegistry {
    fn add_room(&self, room: Room) -> Result<(), RoomJoinError> {
        let mut rooms = self.lock();
        if rooms.contains_key(&room.id) {
            return Err(VirtualError::DuplicateRoom(room.id).into());
        }
        tracing::debug!(room = %room.id, name = %room.name, "room registered");
        rooms.insert(room.id, room);
        Ok(())
    }

    fn remove_room(&self, id: RoomId) -> Result<Option<Room>, RoomJoinError> {
        let removed = self.lock().remove(&id);
        if removed.is_some() {
            tracing::debug!(room = %id, "room removed");
        }
        Ok(removed)
    }

    fn update_room(&self, room: Room) -> Result<(), RoomJoinError> {
        let mut rooms = self.lock();
        let Some(slot) = rooms.get_mut(&room.id) else {
            return Err(VirtualError::UnknownRoom(room.id).into());
        };
        *slot = room;
        Ok(())
    }

    fn get_room(&self, id: RoomId) -> Option<Room> {
        self.lock().get(&id).cloned()
    }

    fn rooms(&self) -> Vec<Room> {
        self.lock().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> Room {
        Room::builder().name(name).build().unwrap()
    }

    #[test]
    fn should_add_and_get_room() {
        let registry = InMemoryRoomRegistry::new();
        let hall = room("Hall");
        let id = hall.id;

        registry.add_room(hall).unwrap();

        assert_eq!(
            registry.get_room(id).map(|r| r.name),
            Some("Hall".to_string())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_reject_duplicate_room() {
        let registry = InMemoryRoomRegistry::new();
        let hall = room("Hall");
        registry.add_room(hall.clone()).unwrap();

        assert!(matches!(
            registry.add_room(hall),
            Err(RoomJoinError::Registry(_))
        ));
    }

    #[test]
    fn should_return_none_when_removing_unknown_room() {
        let registry = InMemoryRoomRegistry::new();
        assert!(registry.remove_room(RoomId::new()).unwrap().is_none());
    }

    #[test]
    fn should_update_existing_room() {
        let registry = InMemoryRoomRegistry::new();
        let mut hall = room("Hall");
        registry.add_room(hall.clone()).unwrap();

        hall.enter_combine_state();
        registry.update_room(hall.clone()).unwrap();

        assert!(registry.get_room(hall.id).unwrap().combine_state);
    }

    #[test]
    fn should_return_not_found_when_updating_unknown_room() {
        let registry = InMemoryRoomRegistry::new();
        assert!(matches!(
            registry.update_room(room("Ghost")),
            Err(RoomJoinError::NotFound(_))
        ));
    }

    #[test]
    fn should_list_every_room() {
        let registry = InMemoryRoomRegistry::new();
        registry.add_room(room("A")).unwrap();
        registry.add_room(room("B")).unwrap();
        assert_eq!(registry.rooms().len(), 2);
    }
}
