use std::collections::HashSet;

use crate::grid::Cell;

/// Anything besides the snake that claims board cells.
///
/// The step function treats an occupied cell as deadly, and food is never
/// placed on one.
pub trait Occupant {
    fn occupies(&self, cell: Cell) -> bool;

    fn cells(&self) -> Vec<Cell>;

    /// Called when the snake's head runs into one of this occupant's cells.
    fn on_collision(&mut self, _cell: Cell) {}
}

/// Fixed walls placed inside the board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Obstacles {
    cells: HashSet<Cell>,
}

impl Obstacles {
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        Obstacles {
            cells: cells.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Occupant for Obstacles {
    fn occupies(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.cells.iter().copied().collect();
        cells.sort_by_key(|c| (c.y, c.x));
        cells
    }
}

pub(crate) fn any_occupies(occupants: &[Box<dyn Occupant>], cell: Cell) -> bool {
    occupants.iter().any(|o| o.occupies(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacles_occupy_their_cells() {
        let walls = Obstacles::new([Cell::new(1, 1), Cell::new(2, 1)]);
        assert!(walls.occupies(Cell::new(1, 1)));
        assert!(walls.occupies(Cell::new(2, 1)));
        assert!(!walls.occupies(Cell::new(3, 1)));
        assert_eq!(walls.cells(), vec![Cell::new(1, 1), Cell::new(2, 1)]);
    }

    #[test]
    fn test_any_occupies_checks_every_provider() {
        let occupants: Vec<Box<dyn Occupant>> = vec![
            Box::new(Obstacles::new([Cell::new(0, 0)])),
            Box::new(Obstacles::new([Cell::new(4, 4)])),
        ];
        assert!(any_occupies(&occupants, Cell::new(4, 4)));
        assert!(!any_occupies(&occupants, Cell::new(2, 2)));
    }
}
