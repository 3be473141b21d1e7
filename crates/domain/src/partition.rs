//! Partition — a physical divider between two cells.
//!
//! A partition knows the cells on either side of it and the hardware
//! controls that sense or drive it. Everything the combination engine needs
//! (the rooms it joins, which controls to read and which to command) is
//! derived from those references.

use std::collections::BTreeSet;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{RoomJoinError, ValidationError};
use crate::id::{ControlId, PartitionId, RoomId};

/// A single capability a partition control may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackFlag {
    /// The control reports the physical state.
    Get,
    /// The control can be commanded.
    Set,
}

/// Two-bit capability set of a partition control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<FeedbackFlag>", into = "Vec<FeedbackFlag>")]
pub struct PartitionFeedback(u8);

impl PartitionFeedback {
    pub const NONE: Self = Self(0);
    pub const GET: Self = Self(0b01);
    pub const SET: Self = Self(0b10);
    pub const GET_SET: Self = Self(0b11);

    /// Whether every capability in `other` is present.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PartitionFeedback {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<FeedbackFlag> for PartitionFeedback {
    fn from(flag: FeedbackFlag) -> Self {
        match flag {
            FeedbackFlag::Get => Self::GET,
            FeedbackFlag::Set => Self::SET,
        }
    }
}

impl From<Vec<FeedbackFlag>> for PartitionFeedback {
    fn from(flags: Vec<FeedbackFlag>) -> Self {
        flags
            .into_iter()
            .map(Self::from)
            .fold(Self::NONE, BitOr::bitor)
    }
}

impl From<PartitionFeedback> for Vec<FeedbackFlag> {
    fn from(feedback: PartitionFeedback) -> Self {
        let mut flags = Vec::with_capacity(2);
        if feedback.contains(PartitionFeedback::GET) {
            flags.push(FeedbackFlag::Get);
        }
        if feedback.contains(PartitionFeedback::SET) {
            flags.push(FeedbackFlag::Set);
        }
        flags
    }
}

/// Association between a partition and one hardware control.
///
/// Ordered by `(feedback, control)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionControlInfo {
    pub feedback: PartitionFeedback,
    pub control: ControlId,
}

impl PartitionControlInfo {
    #[must_use]
    pub fn new(control: ControlId, feedback: PartitionFeedback) -> Self {
        Self { feedback, control }
    }
}

/// A physical divider between exactly two cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub id: PartitionId,
    pub name: String,
    pub cell_a: Option<Cell>,
    pub cell_b: Option<Cell>,
    pub controls: BTreeSet<PartitionControlInfo>,
}

impl Partition {
    /// Create a builder for constructing a [`Partition`].
    #[must_use]
    pub fn builder() -> PartitionBuilder {
        PartitionBuilder::default()
    }

    /// Rooms on either side of the partition, without duplicates.
    #[must_use]
    pub fn rooms(&self) -> BTreeSet<RoomId> {
        [self.cell_a, self.cell_b]
            .into_iter()
            .flatten()
            .filter_map(|cell| cell.room)
            .collect()
    }

    #[must_use]
    pub fn rooms_count(&self) -> usize {
        self.rooms().len()
    }

    /// A partition that touches no room never takes part in combination.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.rooms().is_empty()
    }

    /// Controls that have every capability in `feedback`.
    pub fn controls_with(&self, feedback: PartitionFeedback) -> impl Iterator<Item = ControlId> + '_ {
        self.controls
            .iter()
            .filter(move |info| info.feedback.contains(feedback))
            .map(|info| info.control)
    }

    /// Controls that report the physical state.
    pub fn get_controls(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.controls_with(PartitionFeedback::GET)
    }

    /// Controls that can be commanded.
    pub fn set_controls(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.controls_with(PartitionFeedback::SET)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), RoomJoinError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Partition`].
#[derive(Debug, Default)]
pub struct PartitionBuilder {
    id: Option<PartitionId>,
    name: Option<String>,
    cell_a: Option<Cell>,
    cell_b: Option<Cell>,
    controls: BTreeSet<PartitionControlInfo>,
}

impl PartitionBuilder {
    #[must_use]
    pub fn id(mut self, id: PartitionId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn cell_a(mut self, cell: Cell) -> Self {
        self.cell_a = Some(cell);
        self
    }

    #[must_use]
    pub fn cell_b(mut self, cell: Cell) -> Self {
        self.cell_b = Some(cell);
        self
    }

    /// Shorthand for a partition whose cells hold `a` and `b`, without grid
    /// positions of interest.
    #[must_use]
    pub fn between(self, a: RoomId, b: RoomId) -> Self {
        self.cell_a(Cell::with_room(0, 0, a))
            .cell_b(Cell::with_room(1, 0, b))
    }

    #[must_use]
    pub fn control(mut self, control: ControlId, feedback: PartitionFeedback) -> Self {
        self.controls
            .insert(PartitionControlInfo::new(control, feedback));
        self
    }

    /// Consume the builder, validate, and return a [`Partition`].
    ///
    /// # Errors
    ///
    /// Returns [`RoomJoinError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Partition, RoomJoinError> {
        let partition = Partition {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            cell_a: self.cell_a,
            cell_b: self.cell_b,
            controls: self.controls,
        };
        partition.validate()?;
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_two_rooms_from_cells() {
        let (a, b) = (RoomId::new(), RoomId::new());
        let partition = Partition::builder()
            .name("A|B")
            .between(a, b)
            .build()
            .unwrap();
        assert_eq!(partition.rooms(), BTreeSet::from([a, b]));
        assert_eq!(partition.rooms_count(), 2);
    }

    #[test]
    fn should_deduplicate_rooms_when_both_cells_hold_same_room() {
        let a = RoomId::new();
        let partition = Partition::builder()
            .name("inner")
            .between(a, a)
            .build()
            .unwrap();
        assert_eq!(partition.rooms_count(), 1);
    }

    #[test]
    fn should_be_inert_when_cells_are_empty() {
        let partition = Partition::builder()
            .name("edge")
            .cell_a(Cell::new(0, 0))
            .build()
            .unwrap();
        assert!(partition.is_inert());
    }

    #[test]
    fn should_filter_controls_by_capability() {
        let (sensor, motor, both) = (ControlId::new(), ControlId::new(), ControlId::new());
        let partition = Partition::builder()
            .name("A|B")
            .control(sensor, PartitionFeedback::GET)
            .control(motor, PartitionFeedback::SET)
            .control(both, PartitionFeedback::GET_SET)
            .build()
            .unwrap();

        let gets: BTreeSet<_> = partition.get_controls().collect();
        let sets: BTreeSet<_> = partition.set_controls().collect();
        assert_eq!(gets, BTreeSet::from([sensor, both]));
        assert_eq!(sets, BTreeSet::from([motor, both]));
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Partition::builder().build();
        assert!(matches!(
            result,
            Err(RoomJoinError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_combine_feedback_flags() {
        let both = PartitionFeedback::GET | PartitionFeedback::SET;
        assert_eq!(both, PartitionFeedback::GET_SET);
        assert!(both.contains(PartitionFeedback::GET));
        assert!(!PartitionFeedback::SET.contains(PartitionFeedback::GET));
        assert!(PartitionFeedback::NONE.is_empty());
    }

    #[test]
    fn should_serialize_feedback_as_flag_list() {
        let json = serde_json::to_string(&PartitionFeedback::GET_SET).unwrap();
        assert_eq!(json, r#"["get","set"]"#);
        let parsed: PartitionFeedback = serde_json::from_str(r#"["set"]"#).unwrap();
        assert_eq!(parsed, PartitionFeedback::SET);
    }
}
