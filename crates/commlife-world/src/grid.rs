//! 2D toroidal grid of directional cells.

use crate::cell::Cell;
use commlife_core::{Direction, Error, Position, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// A 2D toroidal grid. Cells are stored row-major, so the cell at `(x, y)`
/// has linear index `y * width + x`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    cells: Vec<Cell>,
    by_identity: HashMap<u32, usize>,
}

impl Grid {
    /// Create a grid with unique random non-zero identities and random
    /// facings, then link every cell to its eight wrapped neighbors.
    pub fn new(width: usize, height: usize, rng: &mut ChaCha8Rng) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Validation(format!(
                "Grid must be at least 1x1, got {}x{}",
                width, height
            )));
        }

        let size = width.checked_mul(height).ok_or_else(|| {
            Error::Validation(format!("Grid {}x{} has too many cells", width, height))
        })?;
        let mut cells = Vec::with_capacity(size);
        let mut by_identity = HashMap::with_capacity(size);

        for index in 0..size {
            let identity = loop {
                let candidate: u32 = rng.gen();
                if candidate != 0 && !by_identity.contains_key(&candidate) {
                    break candidate;
                }
            };
            by_identity.insert(identity, index);

            let position = Position::new((index % width) as i32, (index / width) as i32);
            let facing = Direction::from_index(rng.gen_range(0..Direction::COUNT));
            cells.push(Cell::new(identity, index, position, facing));
        }

        let mut grid = Self {
            width,
            height,
            cells,
            by_identity,
        };
        grid.link_all_neighbors();
        Ok(grid)
    }

    fn link_all_neighbors(&mut self) {
        for index in 0..self.cells.len() {
            let pos = self.cells[index].position();
            for dir in Direction::all() {
                let (dx, dy) = dir.to_delta();
                let neighbor = self.pos_to_index(pos.add(dx, dy));
                self.cells[index].set_neighbor(dir, neighbor);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get cell by linear index
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Get cell at position (with toroidal wrapping)
    pub fn at(&self, pos: Position) -> &Cell {
        &self.cells[self.pos_to_index(pos)]
    }

    /// Linear index of a position, after wrapping
    pub fn pos_to_index(&self, pos: Position) -> usize {
        let wrapped = pos.wrap(self.width as i32, self.height as i32);
        wrapped.y as usize * self.width + wrapped.x as usize
    }

    pub fn identity(&self, index: usize) -> u32 {
        self.cells[index].identity()
    }

    /// Index of the cell faced by the cell at `index`
    pub fn facing_neighbor(&self, index: usize) -> usize {
        self.cells[index].facing_neighbor()
    }

    /// True iff `a` faces `b` and `b` faces `a`
    pub fn mutual_facing(&self, a: usize, b: usize) -> bool {
        self.facing_neighbor(a) == b && self.facing_neighbor(b) == a
    }

    pub fn rotate_left(&mut self, index: usize) {
        self.cells[index].rotate_left();
    }

    pub fn rotate_right(&mut self, index: usize) {
        self.cells[index].rotate_right();
    }

    /// Cell whose identity equals `identity`, if any
    pub fn cell_for_identity(&self, identity: u32) -> Option<usize> {
        self.by_identity.get(&identity).copied()
    }

    /// Smallest and largest cell identity in the grid
    pub fn identity_range(&self) -> (u32, u32) {
        let min = self.cells.iter().map(Cell::identity).min().unwrap_or(0);
        let max = self.cells.iter().map(Cell::identity).max().unwrap_or(0);
        (min, max)
    }

    /// Iterator over all cells
    pub fn iter(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn grid(width: usize, height: usize) -> Grid {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        Grid::new(width, height, &mut rng).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = grid(10, 6);
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 6);
        assert_eq!(grid.len(), 60);
        assert!(grid.iter().all(|c| c.identity() != 0));
        assert!(grid.iter().all(|c| !c.is_occupied()));
    }

    #[test]
    fn test_zero_sized_grid_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(Grid::new(0, 5, &mut rng).is_err());
    }

    #[test]
    fn test_identities_are_unique_and_indexed() {
        let grid = grid(12, 12);
        for cell in grid.iter() {
            assert_eq!(grid.cell_for_identity(cell.identity()), Some(cell.index()));
        }
        let (min, max) = grid.identity_range();
        assert!(min <= max);
        assert!(min > 0);
    }

    #[test]
    fn test_toroidal_wrapping() {
        let grid = grid(10, 10);
        assert_eq!(grid.at(Position::new(-1, -1)).index(), 99);
        assert_eq!(grid.at(Position::new(10, 10)).index(), 0);

        let corner = grid.get(0).unwrap();
        assert_eq!(corner.neighbor(Direction::North), 90);
        assert_eq!(corner.neighbor(Direction::West), 9);
        assert_eq!(corner.neighbor(Direction::NorthWest), 99);
        assert_eq!(corner.neighbor(Direction::SouthEast), 11);
    }

    #[test]
    fn test_cell_positions_are_row_major() {
        let grid = grid(7, 3);
        assert_eq!(grid.get(9).unwrap().position(), Position::new(2, 1));
        for cell in grid.iter() {
            assert_eq!(grid.pos_to_index(cell.position()), cell.index());
        }
    }

    #[test]
    fn test_overflowing_grid_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            Grid::new(usize::MAX, 2, &mut rng),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_mutual_facing() {
        let mut grid = grid(2, 1);
        grid.get_mut(0).unwrap().set_facing(Direction::East);
        grid.get_mut(1).unwrap().set_facing(Direction::West);
        assert!(grid.mutual_facing(0, 1));
        assert!(grid.mutual_facing(1, 0));

        grid.get_mut(1).unwrap().set_facing(Direction::North);
        assert!(!grid.mutual_facing(0, 1));
    }

    proptest! {
        #[test]
        fn neighbor_links_are_symmetric(width in 1usize..8, height in 1usize..8) {
            let grid = grid(width, height);
            for cell in grid.iter() {
                for dir in Direction::all() {
                    let neighbor = grid.get(cell.neighbor(dir)).unwrap();
                    prop_assert_eq!(neighbor.neighbor(dir.opposite()), cell.index());
                }
            }
        }

        #[test]
        fn rotation_is_invertible(start in 0usize..8, turns in 0usize..20) {
            let mut grid = grid(3, 3);
            let start = Direction::from_index(start);
            grid.get_mut(4).unwrap().set_facing(start);
            for _ in 0..turns {
                grid.rotate_right(4);
            }
            for _ in 0..turns {
                grid.rotate_left(4);
            }
            prop_assert_eq!(grid.get(4).unwrap().facing(), start);
        }
    }
}
