//! Room membership queries over a registry snapshot.
//!
//! A composite room lists its member rooms, and a member may itself be
//! composite. [`RoomGraph`] walks that membership breadth-first over an
//! explicit snapshot, so nested combinations never recurse through the
//! registry.

use std::collections::{BTreeMap, BTreeSet};

use roomjoin_domain::graph;
use roomjoin_domain::id::{PartitionId, RoomId};
use roomjoin_domain::room::Room;

/// Snapshot of rooms indexed by id.
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
}

impl RoomGraph {
    #[must_use]
    pub fn new(rooms: impl IntoIterator<Item = Room>) -> Self {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id, room)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Every room reachable through membership from `id`, excluding `id`.
    #[must_use]
    pub fn recursive_rooms(&self, id: RoomId) -> BTreeSet<RoomId> {
        let mut closure = graph::reachable(id, |current| {
            self.rooms
                .get(&current)
                .map(|room| room.rooms.clone())
                .unwrap_or_default()
        });
        closure.remove(&id);
        closure
    }

    /// Partitions of `id` and of every nested composite room.
    #[must_use]
    pub fn recursive_partitions(&self, id: RoomId) -> BTreeSet<PartitionId> {
        let mut partitions: BTreeSet<PartitionId> = self
            .rooms
            .get(&id)
            .map(|room| room.partitions.clone())
            .unwrap_or_default();
        for member in self.recursive_rooms(id) {
            if let Some(room) = self.rooms.get(&member) {
                partitions.extend(room.partitions.iter().copied());
            }
        }
        partitions
    }

    /// The outermost composite room containing `partition`.
    #[must_use]
    pub fn combine_room_of(&self, partition: PartitionId) -> Option<&Room> {
        self.rooms
            .values()
            .filter(|room| room.is_combined())
            .map(|room| (self.recursive_partitions(room.id), room))
            .filter(|(partitions, _)| partitions.contains(&partition))
            .max_by(|(a, ra), (b, rb)| a.len().cmp(&b.len()).then(rb.id.cmp(&ra.id)))
            .map(|(_, room)| room)
    }

    /// The simple member with the lowest combine priority (ties by id).
    #[must_use]
    pub fn master_room(&self, id: RoomId) -> Option<&Room> {
        self.recursive_rooms(id)
            .into_iter()
            .filter_map(|member| self.rooms.get(&member))
            .filter(|room| !room.is_combined())
            .min_by_key(|room| (room.combine_priority, room.id))
    }

    /// Largest non-overlapping rooms: composite rooms plus the simple rooms
    /// they did not absorb.
    ///
    /// Rooms are visited by descending partition count; each yielded room
    /// marks itself and its whole membership closure as visited.
    #[must_use]
    pub fn top_level_rooms(&self) -> Vec<&Room> {
        let mut ordered: Vec<(usize, &Room)> = self
            .rooms
            .values()
            .map(|room| (self.recursive_partitions(room.id).len(), room))
            .collect();
        ordered.sort_by(|(a, ra), (b, rb)| b.cmp(a).then(ra.id.cmp(&rb.id)));

        let mut visited = BTreeSet::new();
        let mut top = Vec::new();
        for (_, room) in ordered {
            if visited.contains(&room.id) {
                continue;
            }
            visited.insert(room.id);
            visited.extend(self.recursive_rooms(room.id));
            top.push(room);
        }
        top
    }
}
