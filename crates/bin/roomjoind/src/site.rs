//! Site assembly — turns the validated configuration into rooms, virtual
//! controls and partitions.

use std::collections::HashMap;
use std::sync::Arc;

use roomjoin_adapter_virtual::{
    InMemoryControlDirectory, InMemoryRoomRegistry, VirtualPartitionControl,
};
use roomjoin_app::ports::{PartitionControl, RoomRegistry};
use roomjoin_domain::error::{RoomJoinError, ValidationError};
use roomjoin_domain::id::{ControlId, RoomId};
use roomjoin_domain::layout::RoomLayout;
use roomjoin_domain::partition::Partition;
use roomjoin_domain::room::Room;

use crate::config::Config;

/// Everything the partition engine needs, built from the site file.
pub struct Site {
    pub registry: Arc<InMemoryRoomRegistry>,
    pub directory: Arc<InMemoryControlDirectory>,
    pub layout: RoomLayout,
    pub partitions: Vec<Partition>,
}

impl Site {
    /// Register rooms and controls, place rooms on the grid and derive
    /// partition cells from room positions.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] when a name does not resolve or
    /// the layout is not one room per position.
    pub fn build(config: &Config) -> Result<Self, RoomJoinError> {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let mut rooms: HashMap<&str, RoomId> = HashMap::new();
        let mut placements = Vec::with_capacity(config.rooms.len());
        for entry in &config.rooms {
            let room = Room::builder()
                .name(entry.name.as_str())
                .combine_priority(entry.combine_priority)
                .build()?;
            rooms.insert(entry.name.as_str(), room.id);
            placements.push(((entry.column, entry.row), room.id));
            registry.add_room(room)?;
        }
        let mut layout = RoomLayout::new();
        layout.set_rooms(placements)?;

        let directory = Arc::new(InMemoryControlDirectory::new());
        let mut controls: HashMap<&str, ControlId> = HashMap::new();
        for entry in &config.controls {
            let control = Arc::new(VirtualPartitionControl::new(entry.name.as_str()));
            control.set_physical(entry.open);
            controls.insert(entry.name.as_str(), control.id());
            directory.insert(control);
        }

        let mut partitions = Vec::with_capacity(config.partitions.len());
        for entry in &config.partitions {
            let mut builder = Partition::builder().name(entry.name.as_str());
            let mut cells = entry.rooms.iter().map(|name| {
                rooms
                    .get(name.as_str())
                    .and_then(|id| layout.cell_of(*id))
                    .ok_or_else(|| ValidationError::UnknownRoom(name.clone()))
            });
            if let Some(cell) = cells.next().transpose()? {
                builder = builder.cell_a(cell);
            }
            if let Some(cell) = cells.next().transpose()? {
                builder = builder.cell_b(cell);
            }
            for control in &entry.controls {
                let id = controls
                    .get(control.control.as_str())
                    .ok_or_else(|| ValidationError::UnknownControl(control.control.clone()))?;
                builder = builder.control(*id, control.feedback);
            }
            partitions.push(builder.build()?);
        }

        tracing::debug!(
            rooms = rooms.len(),
            controls = controls.len(),
            partitions = partitions.len(),
            "site assembled"
        );
        Ok(Self {
            registry,
            directory,
            layout,
            partitions,
        })
    }

    /// Partitions bordering rooms that are not neighbours on the grid.
    ///
    /// These still combine; the check only flags likely typos in the site.
    #[must_use]
    pub fn detached_partitions(&self) -> Vec<&Partition> {
        self.partitions
            .iter()
            .filter(|partition| {
                let rooms: Vec<RoomId> = partition.rooms().into_iter().collect();
                match rooms.as_slice() {
                    [a, b] => !self.layout.neighbors(*a).contains(b),
                    _ => false,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomjoin_app::ports::ControlDirectory;
    use roomjoin_domain::partition::PartitionFeedback;

    fn config(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    const ROW_OF_THREE: &str = "
        [[rooms]]
        name = 'A'
        column = 0
        row = 0

        [[rooms]]
        name = 'B'
        column = 1
        row = 0

        [[rooms]]
        name = 'C'
        column = 2
        row = 0

        [[controls]]
        name = 'AB'
        open = true

        [[controls]]
        name = 'BC'

        [[partitions]]
        name = 'A|B'
        rooms = ['A', 'B']
        controls = [{ control = 'AB' }]

        [[partitions]]
        name = 'B|C'
        rooms = ['B', 'C']
        controls = [{ control = 'BC', feedback = ['set'] }]
    ";

    #[test]
    fn should_register_rooms_and_place_them() {
        let site = Site::build(&config(ROW_OF_THREE)).unwrap();
        assert_eq!(site.registry.len(), 3);
        assert_eq!(site.layout.len(), 3);
        assert!(site.layout.room_at(1, 0).is_some());
    }

    #[test]
    fn should_derive_partition_cells_from_layout() {
        let site = Site::build(&config(ROW_OF_THREE)).unwrap();
        let ab = &site.partitions[0];
        let a = site.layout.room_at(0, 0).unwrap();
        let b = site.layout.room_at(1, 0).unwrap();

        assert_eq!(ab.cell_a.and_then(|c| c.room), Some(a));
        assert_eq!(ab.cell_b.and_then(|c| c.room), Some(b));
        assert_eq!(ab.cell_b.map(|c| (c.column, c.row)), Some((1, 0)));
    }

    #[test]
    fn should_wire_controls_with_initial_state() {
        let site = Site::build(&config(ROW_OF_THREE)).unwrap();
        let ab = &site.partitions[0];
        let info = ab.controls.iter().next().unwrap();

        assert_eq!(info.feedback, PartitionFeedback::GET_SET);
        let control = site.directory.get(info.control).unwrap();
        assert!(control.is_open().unwrap());

        let bc = site.partitions[1].controls.iter().next().unwrap();
        assert_eq!(bc.feedback, PartitionFeedback::SET);
    }

    #[test]
    fn should_build_inert_partition_without_rooms() {
        let site = Site::build(&config(
            "
            [[partitions]]
            name = 'loose panel'
            ",
        ))
        .unwrap();
        assert!(site.partitions[0].is_inert());
    }

    #[test]
    fn should_fail_on_unknown_room() {
        let result = Site::build(&config(
            "
            [[partitions]]
            name = 'p'
            rooms = ['nowhere']
            ",
        ));
        assert!(matches!(
            result,
            Err(RoomJoinError::Validation(ValidationError::UnknownRoom(_)))
        ));
    }

    #[test]
    fn should_fail_on_unknown_control() {
        let result = Site::build(&config(
            "
            [[partitions]]
            name = 'p'
            controls = [{ control = 'missing' }]
            ",
        ));
        assert!(matches!(
            result,
            Err(RoomJoinError::Validation(ValidationError::UnknownControl(_)))
        ));
    }

    #[test]
    fn should_flag_partition_between_distant_rooms() {
        let site = Site::build(&config(
            "
            [[rooms]]
            name = 'A'
            column = 0
            row = 0

            [[rooms]]
            name = 'Far'
            column = 5
            row = 5

            [[partitions]]
            name = 'odd'
            rooms = ['A', 'Far']
            ",
        ))
        .unwrap();
        assert_eq!(site.detached_partitions().len(), 1);
    }
}
