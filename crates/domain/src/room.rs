//! Room — a container of child resources, possibly composed of other rooms.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RoomJoinError, ValidationError};
use crate::id::{PartitionId, ResourceId, RoomId};

/// Who created a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomOrigin {
    /// Created by settings, outside the combination engine.
    #[default]
    Configured,
    /// Created by the combination engine for a group of open partitions.
    Combined,
}

/// A physical or logical room.
///
/// A room is *composite* when it references partitions; its member rooms are
/// then the rooms those partitions join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Lower wins when picking the master room of a combination.
    pub combine_priority: i32,
    /// True while the room is a member of some composite room.
    pub combine_state: bool,
    pub origin: RoomOrigin,
    pub resources: BTreeSet<ResourceId>,
    pub rooms: BTreeSet<RoomId>,
    pub partitions: BTreeSet<PartitionId>,
}

impl Room {
    /// Create a builder for constructing a [`Room`].
    #[must_use]
    pub fn builder() -> RoomBuilder {
        RoomBuilder::default()
    }

    #[must_use]
    pub fn is_combined(&self) -> bool {
        !self.partitions.is_empty()
    }

    /// Whether the combination engine owns this room's lifecycle.
    #[must_use]
    pub fn is_engine_created(&self) -> bool {
        self.origin == RoomOrigin::Combined
    }

    pub fn enter_combine_state(&mut self) {
        self.combine_state = true;
    }

    pub fn leave_combine_state(&mut self) {
        self.combine_state = false;
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - only one of `rooms` / `partitions` is populated
    ///   ([`ValidationError::PartialComposite`])
    pub fn validate(&self) -> Result<(), RoomJoinError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.rooms.is_empty() != self.partitions.is_empty() {
            return Err(ValidationError::PartialComposite.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Room`].
#[derive(Debug, Default)]
pub struct RoomBuilder {
    id: Option<RoomId>,
    name: Option<String>,
    combine_priority: i32,
    origin: RoomOrigin,
    resources: BTreeSet<ResourceId>,
    rooms: BTreeSet<RoomId>,
    partitions: BTreeSet<PartitionId>,
}

impl RoomBuilder {
    #[must_use]
    pub fn id(mut self, id: RoomId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn combine_priority(mut self, priority: i32) -> Self {
        self.combine_priority = priority;
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: RoomOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: ResourceId) -> Self {
        self.resources.insert(resource);
        self
    }

    #[must_use]
    pub fn member(mut self, room: RoomId) -> Self {
        self.rooms.insert(room);
        self
    }

    #[must_use]
    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.partitions.insert(partition);
        self
    }

    /// Consume the builder, validate, and return a [`Room`].
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] if `name` is missing or the
    /// composite membership is partial.
    pub fn build(self) -> Result<Room, RoomJoinError> {
        let room = Room {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            combine_priority: self.combine_priority,
            combine_state: false,
            origin: self.origin,
            resources: self.resources,
            rooms: self.rooms,
            partitions: self.partitions,
        };
        room.validate()?;
        Ok(room)
    }
}
