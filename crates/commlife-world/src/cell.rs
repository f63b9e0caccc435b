//! A single grid site and its fixed neighborhood.

use commlife_core::{Direction, Position};

/// One site of the toroidal grid.
///
/// Neighbor links are cell indices into the owning `Grid`, one per compass
/// direction, fixed once the grid is built.
#[derive(Debug, Clone)]
pub struct Cell {
    identity: u32,
    index: usize,
    position: Position,
    facing: Direction,
    neighbors: [usize; 8],
    occupied: bool,
}

impl Cell {
    pub(crate) fn new(identity: u32, index: usize, position: Position, facing: Direction) -> Self {
        Self {
            identity,
            index,
            position,
            facing,
            neighbors: [index; 8],
            occupied: false,
        }
    }

    /// Opaque label assigned at creation, never zero
    pub fn identity(&self) -> u32 {
        self.identity
    }

    /// Linear index in the flattened grid
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    pub fn rotate_left(&mut self) {
        self.facing = self.facing.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.facing = self.facing.rotate_right();
    }

    pub fn neighbor(&self, dir: Direction) -> usize {
        self.neighbors[dir.index()]
    }

    pub fn neighbors(&self) -> &[usize; 8] {
        &self.neighbors
    }

    pub(crate) fn set_neighbor(&mut self, dir: Direction, cell: usize) {
        self.neighbors[dir.index()] = cell;
    }

    /// Index of the cell in the current facing direction
    pub fn facing_neighbor(&self) -> usize {
        self.neighbor(self.facing)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_tracks_facing_neighbor() {
        let mut cell = Cell::new(99, 0, Position::new(0, 0), Direction::North);
        for (i, dir) in Direction::all().into_iter().enumerate() {
            cell.set_neighbor(dir, i + 10);
        }

        assert_eq!(cell.facing_neighbor(), 10);
        cell.rotate_right();
        assert_eq!(cell.facing(), Direction::NorthEast);
        assert_eq!(cell.facing_neighbor(), 11);
        cell.rotate_left();
        cell.rotate_left();
        assert_eq!(cell.facing(), Direction::NorthWest);
        assert_eq!(cell.facing_neighbor(), 17);
    }

    #[test]
    fn test_occupancy_flag() {
        let mut cell = Cell::new(1, 4, Position::new(1, 1), Direction::South);
        assert!(!cell.is_occupied());
        cell.set_occupied(true);
        assert!(cell.is_occupied());
        assert_eq!(cell.identity(), 1);
        assert_eq!(cell.index(), 4);
    }
}
