//! Room layout — bidirectional map between grid positions and rooms.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::cell::Cell;
use crate::error::{RoomJoinError, ValidationError};
use crate::id::RoomId;

type Position = (i32, i32);

const NEIGHBOR_OFFSETS: [Position; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// `(column + dc, row + dr)`, or `None` past the edge of the grid.
fn offset(column: i32, row: i32, dc: i32, dr: i32) -> Option<Position> {
    Some((column.checked_add(dc)?, row.checked_add(dr)?))
}

/// One room per position and one position per room.
#[derive(Debug, Clone, Default)]
pub struct RoomLayout {
    by_position: BTreeMap<Position, RoomId>,
    by_room: HashMap<RoomId, Position>,
}

impl RoomLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole layout with `rooms`.
    ///
    /// The batch is validated before anything is committed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicatePosition`] or
    /// [`ValidationError::DuplicateRoom`] when the batch is not 1:1; the
    /// existing layout is left untouched.
    pub fn set_rooms<I>(&mut self, rooms: I) -> Result<(), RoomJoinError>
    where
        I: IntoIterator<Item = (Position, RoomId)>,
    {
        let mut by_position = BTreeMap::new();
        let mut by_room = HashMap::new();
        for ((column, row), room) in rooms {
            if by_position.insert((column, row), room).is_some() {
                return Err(ValidationError::DuplicatePosition { column, row }.into());
            }
            if by_room.insert(room, (column, row)).is_some() {
                return Err(ValidationError::DuplicateRoom(room.to_string()).into());
            }
        }
        self.by_position = by_position;
        self.by_room = by_room;
        Ok(())
    }

    /// Place a single room.
    ///
    /// Re-placing a room at its current position is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the position holds another room or
    /// the room already sits elsewhere.
    pub fn set_room(&mut self, position: Position, room: RoomId) -> Result<(), RoomJoinError> {
        match self.by_position.get(&position) {
            Some(existing) if *existing == room => return Ok(()),
            Some(_) => {
                let (column, row) = position;
                return Err(ValidationError::DuplicatePosition { column, row }.into());
            }
            None => {}
        }
        if self.by_room.contains_key(&room) {
            return Err(ValidationError::DuplicateRoom(room.to_string()).into());
        }
        self.by_position.insert(position, room);
        self.by_room.insert(room, position);
        Ok(())
    }

    /// Remove a room, returning the position it occupied.
    pub fn remove_room(&mut self, room: RoomId) -> Option<Position> {
        let position = self.by_room.remove(&room)?;
        self.by_position.remove(&position);
        Some(position)
    }

    #[must_use]
    pub fn room_at(&self, column: i32, row: i32) -> Option<RoomId> {
        self.by_position.get(&(column, row)).copied()
    }

    #[must_use]
    pub fn position_of(&self, room: RoomId) -> Option<Position> {
        self.by_room.get(&room).copied()
    }

    /// Layout cell of a placed room.
    #[must_use]
    pub fn cell_of(&self, room: RoomId) -> Option<Cell> {
        self.position_of(room)
            .map(|(column, row)| Cell::with_room(column, row, room))
    }

    /// Rooms sharing an edge with `room`.
    #[must_use]
    pub fn neighbors(&self, room: RoomId) -> BTreeSet<RoomId> {
        let Some((column, row)) = self.position_of(room) else {
            return BTreeSet::new();
        };
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(|(dc, dr)| offset(column, row, dc, dr))
            .filter_map(|(column, row)| self.room_at(column, row))
            .collect()
    }

    /// Every pair of edge-sharing rooms, each pair once.
    ///
    /// Grid deployments use this to suggest where partitions may exist.
    #[must_use]
    pub fn adjacent_room_pairs(&self) -> Vec<(RoomId, RoomId)> {
        let mut pairs = Vec::new();
        for (&(column, row), &room) in &self.by_position {
            for (dc, dr) in [(1, 0), (0, 1)] {
                let other = offset(column, row, dc, dr).and_then(|(c, r)| self.room_at(c, r));
                if let Some(other) = other {
                    pairs.push((room, other));
                }
            }
        }
        pairs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}
