//! Cell — a grid coordinate optionally occupied by a room.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::id::RoomId;

/// A `(column, row)` position on the venue grid.
///
/// Equality and ordering only consider the position; the room reference is
/// assigned by settings and does not change a cell's identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cell {
    pub column: i32,
    pub row: i32,
    pub room: Option<RoomId>,
}

impl Cell {
    /// An empty cell at the given position.
    #[must_use]
    pub fn new(column: i32, row: i32) -> Self {
        Self {
            column,
            row,
            room: None,
        }
    }

    /// A cell at the given position occupied by `room`.
    #[must_use]
    pub fn with_room(column: i32, row: i32, room: RoomId) -> Self {
        Self {
            column,
            row,
            room: Some(room),
        }
    }

    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        (self.column, self.row)
    }

    /// Whether `other` shares an edge with this cell.
    #[must_use]
    pub fn is_neighbor_of(&self, other: &Cell) -> bool {
        let dc = self.column.abs_diff(other.column);
        let dr = self.row.abs_diff(other.row);
        matches!((dc, dr), (0, 1) | (1, 0))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.position().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compare_by_position_only() {
        let a = Cell::with_room(1, 2, RoomId::new());
        let b = Cell::new(1, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn should_order_by_column_then_row() {
        let mut cells = vec![Cell::new(1, 0), Cell::new(0, 5), Cell::new(0, 1)];
        cells.sort();
        let positions: Vec<_> = cells.iter().map(Cell::position).collect();
        assert_eq!(positions, vec![(0, 1), (0, 5), (1, 0)]);
    }

    #[test]
    fn should_detect_edge_neighbors() {
        let origin = Cell::new(0, 0);
        assert!(origin.is_neighbor_of(&Cell::new(1, 0)));
        assert!(origin.is_neighbor_of(&Cell::new(0, -1)));
        assert!(!origin.is_neighbor_of(&Cell::new(1, 1)));
        assert!(!origin.is_neighbor_of(&origin));
    }

    #[test]
    fn should_not_overflow_on_grid_edges() {
        let min = Cell::new(i32::MIN, 0);
        let max = Cell::new(i32::MAX, 0);
        assert!(!min.is_neighbor_of(&max));
        assert!(max.is_neighbor_of(&Cell::new(i32::MAX - 1, 0)));

        let bottom = Cell::new(0, i32::MIN);
        assert!(bottom.is_neighbor_of(&Cell::new(0, i32::MIN + 1)));
        assert!(!bottom.is_neighbor_of(&Cell::new(0, i32::MAX)));
    }
}
