use std::collections::VecDeque;

use log::{debug, warn};
use rand::Rng;

use crate::error::{Result, SneakError};
use crate::occupant::{any_occupies, Occupant};

/// Free columns required beside the starting snake.
pub const BOARD_MARGIN: u16 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub fn new(width: u16, height: u16) -> Self {
        Size { width, height }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    pub x: i32,
    pub y: i32,
}

impl From<Direction> for Delta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => Delta { x: 0, y: -1 },
            Direction::Down => Delta { x: 0, y: 1 },
            Direction::Left => Delta { x: -1, y: 0 },
            Direction::Right => Delta { x: 1, y: 0 },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    pub const fn new(x: u16, y: u16) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell, or `None` when it falls off the board.
    pub fn checked_add(&self, delta: Delta, size: Size) -> Option<Cell> {
        let x = self.x as i32 + delta.x;
        let y = self.y as i32 + delta.y;
        if x < 0 || y < 0 || x >= size.width as i32 || y >= size.height as i32 {
            return None;
        }
        Some(Cell {
            x: x as u16,
            y: y as u16,
        })
    }
}

/// Body cells stored head first: index 0 is always the head.
#[derive(Clone, Debug, PartialEq)]
pub struct Snake {
    body: VecDeque<Cell>,
    direction: Direction,
    pending: Direction,
}

impl Snake {
    /// A horizontal snake on the middle row, facing right, with its head on
    /// the centre column when the body fits behind it.
    fn centered(size: Size, initial_length: u16) -> Self {
        let head_x = (size.width / 2).max(initial_length - 1);
        let row = size.height / 2;

        let body = (0..initial_length)
            .map(|i| Cell::new(head_x - i, row))
            .collect();

        Snake {
            body,
            direction: Direction::Right,
            pending: Direction::Right,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.body.iter().copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    /// Buffers a direction for the next tick. A reversal of the committed
    /// direction is refused while the snake has a body behind its head.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.body.len() > 1 && direction == self.direction.opposite() {
            return false;
        }
        self.pending = direction;
        true
    }

    pub(crate) fn commit_direction(&mut self) -> Direction {
        self.direction = self.pending;
        self.direction
    }

    pub(crate) fn push_head(&mut self, cell: Cell) {
        self.body.push_front(cell);
    }

    pub(crate) fn pop_tail(&mut self) -> Option<Cell> {
        self.body.pop_back()
    }
}

/// The authoritative discrete state of one round.
#[derive(Clone, Debug)]
pub struct Grid {
    size: Size,
    snake: Snake,
    food: Option<Cell>,
    food_attempts: u32,
}

impl Grid {
    pub fn initialize(
        size: Size,
        initial_length: u16,
        food_attempts: u32,
        occupants: &[Box<dyn Occupant>],
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if initial_length == 0 {
            return Err(SneakError::InvalidLength);
        }
        let needed = initial_length.saturating_add(BOARD_MARGIN);
        if size.width < needed || size.height < needed {
            return Err(SneakError::InvalidDimensions {
                width: size.width,
                height: size.height,
                initial_length,
            });
        }

        let snake = Snake::centered(size, initial_length);
        if let Some(blocked) = snake.cells().find(|&c| any_occupies(occupants, c)) {
            return Err(SneakError::BlockedStart {
                x: blocked.x,
                y: blocked.y,
            });
        }

        let mut grid = Grid {
            size,
            snake,
            food: None,
            food_attempts,
        };
        grid.place_food(occupants, rng);
        Ok(grid)
    }

    /// Moves the food to a random free cell. Gives up after `food_attempts`
    /// misses and leaves the board without food.
    pub fn place_food(
        &mut self,
        occupants: &[Box<dyn Occupant>],
        rng: &mut impl Rng,
    ) -> Option<Cell> {
        for _ in 0..self.food_attempts {
            let cell = Cell {
                x: rng.gen_range(0..self.size.width),
                y: rng.gen_range(0..self.size.height),
            };
            if !self.snake.contains(cell) && !any_occupies(occupants, cell) {
                debug!("Food placed at ({}, {})", cell.x, cell.y);
                self.food = Some(cell);
                return self.food;
            }
        }

        warn!(
            "No free cell found for food after {} attempts",
            self.food_attempts
        );
        self.food = None;
        None
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub(crate) fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn set_direction(&mut self, direction: Direction) -> bool {
        self.snake.set_direction(direction)
    }

    /// Head-first copy of the snake, as consumed by the presenter.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.snake.cells().collect()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        size: Size,
        cells: &[Cell],
        direction: Direction,
        food: Option<Cell>,
    ) -> Self {
        Grid {
            size,
            snake: Snake {
                body: cells.iter().copied().collect(),
                direction,
                pending: direction,
            },
            food,
            food_attempts: 1000,
        }
    }
}
