//! Partitions collection — the adjacency index over partitions and rooms.
//!
//! The partitions themselves are the source of truth. The room and control
//! indices are caches that are rebuilt for a partition whenever it is
//! inserted, removed, or has its cells or controls changed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::cell::Cell;
use crate::error::{NotFoundError, RoomJoinError};
use crate::graph;
use crate::id::{ControlId, PartitionId, RoomId};
use crate::partition::{Partition, PartitionControlInfo, PartitionFeedback};

/// Partitions plus their `room → partitions` and `control → partitions`
/// indices.
#[derive(Debug, Clone, Default)]
pub struct PartitionsCollection {
    partitions: BTreeMap<PartitionId, Partition>,
    by_room: HashMap<RoomId, BTreeSet<PartitionId>>,
    by_control: HashMap<ControlId, BTreeSet<PartitionId>>,
}

impl PartitionsCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a partition, replacing any partition with the same id.
    pub fn insert(&mut self, partition: Partition) -> Option<Partition> {
        let previous = self.partitions.remove(&partition.id);
        if let Some(previous) = &previous {
            self.unindex(previous);
        }
        self.index(&partition);
        self.partitions.insert(partition.id, partition);
        previous
    }

    pub fn remove(&mut self, id: PartitionId) -> Option<Partition> {
        let partition = self.partitions.remove(&id)?;
        self.unindex(&partition);
        Some(partition)
    }

    /// Replace the controls of a partition and reindex it.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::NotFound`] when `id` is unknown.
    pub fn set_partition_controls(
        &mut self,
        id: PartitionId,
        controls: BTreeSet<PartitionControlInfo>,
    ) -> Result<(), RoomJoinError> {
        self.modify(id, |partition| partition.controls = controls)
    }

    /// Replace the cells of a partition and reindex it.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::NotFound`] when `id` is unknown.
    pub fn set_partition_cells(
        &mut self,
        id: PartitionId,
        cell_a: Option<Cell>,
        cell_b: Option<Cell>,
    ) -> Result<(), RoomJoinError> {
        self.modify(id, |partition| {
            partition.cell_a = cell_a;
            partition.cell_b = cell_b;
        })
    }

    /// Drop both indices and rebuild them from the partitions.
    pub fn rebuild(&mut self) {
        self.by_room.clear();
        self.by_control.clear();
        let partitions: Vec<Partition> = self.partitions.values().cloned().collect();
        for partition in &partitions {
            self.index(partition);
        }
    }

    #[must_use]
    pub fn get(&self, id: PartitionId) -> Option<&Partition> {
        self.partitions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    #[must_use]
    pub fn ids(&self) -> BTreeSet<PartitionId> {
        self.partitions.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Partitions sensed or driven by `control`.
    #[must_use]
    pub fn get_partitions(&self, control: ControlId) -> BTreeSet<PartitionId> {
        self.by_control.get(&control).cloned().unwrap_or_default()
    }

    /// Partitions touching `room`.
    #[must_use]
    pub fn get_room_adjacent_partitions(&self, room: RoomId) -> BTreeSet<PartitionId> {
        self.by_room.get(&room).cloned().unwrap_or_default()
    }

    /// Partitions sharing at least one room with `id`, excluding `id`.
    #[must_use]
    pub fn get_adjacent_partitions(&self, id: PartitionId) -> BTreeSet<PartitionId> {
        let Some(partition) = self.partitions.get(&id) else {
            return BTreeSet::new();
        };
        let mut adjacent: BTreeSet<PartitionId> = partition
            .rooms()
            .into_iter()
            .filter_map(|room| self.by_room.get(&room))
            .flatten()
            .copied()
            .collect();
        adjacent.remove(&id);
        adjacent
    }

    /// Maximal groups of `partitions` linked by shared rooms.
    ///
    /// Adjacency is restricted to the input. Unknown ids are dropped; every
    /// known id appears in exactly one group.
    #[must_use]
    pub fn group_contiguous(
        &self,
        partitions: &BTreeSet<PartitionId>,
    ) -> Vec<BTreeSet<PartitionId>> {
        let known: BTreeSet<PartitionId> = partitions
            .iter()
            .copied()
            .filter(|id| self.partitions.contains_key(id))
            .collect();
        graph::connected_components(&known, |id| self.get_adjacent_partitions(id))
    }

    /// Groups left behind once `removed` leaves a composite room.
    #[must_use]
    pub fn split_by_partition(
        &self,
        partitions: &BTreeSet<PartitionId>,
        removed: PartitionId,
    ) -> Vec<BTreeSet<PartitionId>> {
        self.split_by_partitions(partitions, &BTreeSet::from([removed]))
    }

    /// Groups left behind once every partition in `removed` leaves a
    /// composite room.
    ///
    /// Any two remaining partitions sharing a room stay linked, since other
    /// open partitions may still bridge the rooms `removed` used to join.
    #[must_use]
    pub fn split_by_partitions(
        &self,
        partitions: &BTreeSet<PartitionId>,
        removed: &BTreeSet<PartitionId>,
    ) -> Vec<BTreeSet<PartitionId>> {
        let remaining = partitions.difference(removed).copied().collect();
        self.group_contiguous(&remaining)
    }

    /// Union of the rooms touched by `partitions`.
    #[must_use]
    pub fn rooms_of(&self, partitions: &BTreeSet<PartitionId>) -> BTreeSet<RoomId> {
        partitions
            .iter()
            .filter_map(|id| self.partitions.get(id))
            .flat_map(Partition::rooms)
            .collect()
    }

    /// Every control with all capabilities in `feedback`, across partitions.
    #[must_use]
    pub fn control_ids_with(&self, feedback: PartitionFeedback) -> BTreeSet<ControlId> {
        self.partitions
            .values()
            .flat_map(|partition| partition.controls_with(feedback))
            .collect()
    }

    fn modify<F>(&mut self, id: PartitionId, change: F) -> Result<(), RoomJoinError>
    where
        F: FnOnce(&mut Partition),
    {
        let mut partition = self.partitions.remove(&id).ok_or_else(|| NotFoundError {
            entity: "Partition",
            id: id.to_string(),
        })?;
        self.unindex(&partition);
        change(&mut partition);
        self.index(&partition);
        self.partitions.insert(id, partition);
        Ok(())
    }

    fn index(&mut self, partition: &Partition) {
        for room in partition.rooms() {
            self.by_room.entry(room).or_default().insert(partition.id);
        }
        for info in &partition.controls {
            self.by_control
                .entry(info.control)
                .or_default()
                .insert(partition.id);
        }
    }

    fn unindex(&mut self, partition: &Partition) {
        for room in partition.rooms() {
            remove_from(&mut self.by_room, room, partition.id);
        }
        for info in &partition.controls {
            remove_from(&mut self.by_control, info.control, partition.id);
        }
    }
}

fn remove_from<K>(index: &mut HashMap<K, BTreeSet<PartitionId>>, key: K, id: PartitionId)
where
    K: std::hash::Hash + Eq,
{
    if let Some(set) = index.get_mut(&key) {
        set.remove(&id);
        if set.is_empty() {
            index.remove(&key);
        }
    }
}
