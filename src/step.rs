use log::debug;
use rand::Rng;

use crate::grid::{Cell, Grid};
use crate::occupant::Occupant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    Body,
    Obstacle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate {
        at: Cell,
        score: u32,
        next_food: Option<Cell>,
    },
    Collided(Collision),
}

impl StepOutcome {
    pub fn is_collision(&self) -> bool {
        matches!(self, StepOutcome::Collided(_))
    }
}

/// Score of the current round plus the best score of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    high_score: u32,
    reward: u32,
}

impl Scoreboard {
    pub fn new(reward: u32) -> Self {
        Scoreboard {
            score: 0,
            high_score: 0,
            reward,
        }
    }

    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn reward(&self) -> u32 {
        self.reward
    }

    fn award(&mut self) -> u32 {
        self.score = self.score.saturating_add(self.reward);
        self.high_score = self.high_score.max(self.score);
        self.score
    }

    pub(crate) fn clear_score(&mut self) {
        self.score = 0;
    }

    pub(crate) fn clear_high_score(&mut self) {
        self.high_score = 0;
    }
}

/// Advances the round by exactly one tick.
///
/// A collision leaves the grid untouched; the caller decides what it means
/// for the session.
pub fn step(
    grid: &mut Grid,
    scoreboard: &mut Scoreboard,
    occupants: &mut [Box<dyn Occupant>],
    rng: &mut impl Rng,
) -> StepOutcome {
    let size = grid.size();
    let direction = grid.snake_mut().commit_direction();
    let snake = grid.snake();

    let Some(next) = snake.head().checked_add(direction.into(), size) else {
        return StepOutcome::Collided(Collision::Wall);
    };

    let eating = grid.food() == Some(next);

    // The tail cell is free this tick unless the snake is about to grow.
    let vacating = !eating && next == snake.tail();
    if snake.contains(next) && !vacating {
        return StepOutcome::Collided(Collision::Body);
    }

    if let Some(occupant) = occupants.iter_mut().find(|o| o.occupies(next)) {
        occupant.on_collision(next);
        return StepOutcome::Collided(Collision::Obstacle);
    }

    grid.snake_mut().push_head(next);

    if eating {
        let score = scoreboard.award();
        let next_food = grid.place_food(occupants, rng);
        debug!("Ate food at ({}, {}), score {}", next.x, next.y, score);
        StepOutcome::Ate {
            at: next,
            score,
            next_food,
        }
    } else {
        grid.snake_mut().pop_tail();
        StepOutcome::Moved
    }
}
