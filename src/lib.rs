//! Grid snake with a fixed-timestep simulation.
//!
//! [`Game`] owns everything for one independent game. A UI drives it by
//! calling [`Game::frame`] with a millisecond timestamp once per display
//! refresh and forwarding player intents (`start`, `toggle_pause`, `reset`,
//! `set_direction`). Each frame returns the ticks that ran, the
//! [`GameEvent`]s they raised and an interpolated [`RenderState`] to draw.

pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod grid;
pub mod occupant;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod step;

pub use config::GameConfig;
pub use error::{Result, SneakError};
pub use event::GameEvent;
pub use game::{Frame, Game, GameSettings, HighScorePolicy};
pub use grid::{Cell, Direction, Grid, Size};
pub use occupant::{Obstacles, Occupant};
pub use presenter::{interpolate, Point, RenderState};
pub use scheduler::Scheduler;
pub use session::{Session, SessionState};
pub use step::{step, Collision, Scoreboard, StepOutcome};
