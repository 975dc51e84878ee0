//! Notifications for the UI. The core never draws or prints anything itself.

use crate::grid::Cell;
use crate::step::Collision;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Started { round: u64 },
    Paused,
    Resumed,
    Reset,
    FoodEaten { at: Cell, score: u32 },
    /// Food could not be placed; the board is full or nearly so.
    BoardSaturated,
    /// Raised once per round.
    GameOver {
        final_score: u32,
        high_score: u32,
        cause: Collision,
    },
}
