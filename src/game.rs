use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::{Result, SneakError};
use crate::event::GameEvent;
use crate::grid::{Cell, Direction, Grid, Size};
use crate::occupant::{Obstacles, Occupant};
use crate::presenter::{interpolate, RenderState};
use crate::scheduler::Scheduler;
use crate::session::{Session, SessionState};
use crate::step::{step, Scoreboard, StepOutcome};

/// What `reset` does to the high score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighScorePolicy {
    /// Kept for as long as the `Game` lives.
    #[default]
    PerSession,
    ClearOnReset,
}

/// Everything the core needs to run a round.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    pub size: Size,
    pub ticks_per_second: f64,
    pub max_frame_delta_ms: f64,
    pub initial_length: u16,
    pub food_reward: u32,
    pub food_attempts: u32,
    pub high_score_policy: HighScorePolicy,
    pub seed: Option<u64>,
    pub obstacles: Vec<Cell>,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            size: Size::new(20, 20),
            ticks_per_second: 1000.0 / 120.0,
            max_frame_delta_ms: 250.0,
            initial_length: 4,
            food_reward: 10,
            food_attempts: 1000,
            high_score_policy: HighScorePolicy::PerSession,
            seed: None,
            obstacles: Vec::new(),
        }
    }
}

/// Result of one display frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub ticks: u32,
    pub events: Vec<GameEvent>,
    pub render: RenderState,
}

/// One independent game: the session, its board and its clock.
///
/// The UI owns a `Game`, forwards player intents to it, and calls
/// [`Game::frame`] once per display refresh.
pub struct Game {
    settings: GameSettings,
    session: Session,
    scheduler: Scheduler,
    template: Grid,
    grid: Grid,
    previous: Vec<Cell>,
    scoreboard: Scoreboard,
    occupants: Vec<Box<dyn Occupant>>,
    rng: StdRng,
}

impl Game {
    pub fn new(settings: GameSettings) -> Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (scheduler, occupants, template) = Self::build(&settings, &mut rng)?;

        let grid = template.clone();
        let previous = grid.snapshot();
        info!(
            "New game on {}x{} board at {:.2} ticks/s",
            settings.size.width, settings.size.height, settings.ticks_per_second
        );

        Ok(Game {
            scoreboard: Scoreboard::new(settings.food_reward),
            settings,
            session: Session::new(),
            scheduler,
            template,
            grid,
            previous,
            occupants,
            rng,
        })
    }

    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.scoreboard = self.scoreboard.with_high_score(high_score);
        self
    }

    fn build(
        settings: &GameSettings,
        rng: &mut StdRng,
    ) -> Result<(Scheduler, Vec<Box<dyn Occupant>>, Grid)> {
        let scheduler = Scheduler::new(settings.ticks_per_second, settings.max_frame_delta_ms)?;
        if settings.food_reward == 0 {
            return Err(SneakError::InvalidReward);
        }
        if settings.food_attempts == 0 {
            return Err(SneakError::InvalidFoodAttempts);
        }
        if let Some(cell) = settings
            .obstacles
            .iter()
            .find(|&&c| !settings.size.contains(c))
        {
            return Err(SneakError::ObstacleOutOfBounds {
                x: cell.x,
                y: cell.y,
            });
        }

        let mut occupants: Vec<Box<dyn Occupant>> = Vec::new();
        let obstacles = Obstacles::new(settings.obstacles.iter().copied());
        if !obstacles.is_empty() {
            occupants.push(Box::new(obstacles));
        }

        let template = Grid::initialize(
            settings.size,
            settings.initial_length,
            settings.food_attempts,
            &occupants,
            rng,
        )?;
        Ok((scheduler, occupants, template))
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn round(&self) -> u64 {
        self.session.round()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.scoreboard.score()
    }

    pub fn high_score(&self) -> u32 {
        self.scoreboard.high_score()
    }

    /// Idle or GameOver -> Running on a freshly laid out board.
    pub fn start(&mut self) -> Vec<GameEvent> {
        if !matches!(
            self.session.state(),
            SessionState::Idle | SessionState::GameOver
        ) {
            return Vec::new();
        }
        self.new_board();
        self.scoreboard.clear_score();
        self.session.start();
        vec![GameEvent::Started {
            round: self.session.round(),
        }]
    }

    pub fn pause(&mut self) -> Vec<GameEvent> {
        if self.session.pause() {
            vec![GameEvent::Paused]
        } else {
            Vec::new()
        }
    }

    pub fn resume(&mut self) -> Vec<GameEvent> {
        if self.session.resume() {
            vec![GameEvent::Resumed]
        } else {
            Vec::new()
        }
    }

    pub fn toggle_pause(&mut self) -> Vec<GameEvent> {
        match self.session.state() {
            SessionState::Running => self.pause(),
            SessionState::Paused => self.resume(),
            _ => Vec::new(),
        }
    }

    /// Back to Idle with score cleared and the snake in its starting place.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        self.session.reset();
        self.new_board();
        self.scoreboard.clear_score();
        if self.settings.high_score_policy == HighScorePolicy::ClearOnReset {
            self.scoreboard.clear_high_score();
        }
        vec![GameEvent::Reset]
    }

    /// Resets onto new settings. On error the game is left untouched.
    pub fn reset_with(&mut self, settings: GameSettings) -> Result<Vec<GameEvent>> {
        let (scheduler, occupants, template) = Self::build(&settings, &mut self.rng)?;
        let high_score = self.scoreboard.high_score();

        self.scheduler = scheduler;
        self.occupants = occupants;
        self.template = template;
        self.scoreboard = Scoreboard::new(settings.food_reward).with_high_score(high_score);
        self.settings = settings;
        Ok(self.reset())
    }

    /// Buffers a turn for the next tick; refused turns return `false`.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        self.grid.set_direction(direction)
    }

    /// Drives the simulation from a display refresh at `timestamp` ms.
    pub fn frame(&mut self, timestamp: f64) -> Frame {
        let mut events = Vec::new();
        let round = self.session.round();

        let ticks = self
            .scheduler
            .advance(timestamp, self.session.is_running(), || {
                self.previous = self.grid.snapshot();
                match step(
                    &mut self.grid,
                    &mut self.scoreboard,
                    &mut self.occupants,
                    &mut self.rng,
                ) {
                    StepOutcome::Moved => {}
                    StepOutcome::Ate {
                        at,
                        score,
                        next_food,
                    } => {
                        events.push(GameEvent::FoodEaten { at, score });
                        if next_food.is_none() {
                            events.push(GameEvent::BoardSaturated);
                        }
                    }
                    StepOutcome::Collided(cause) => {
                        if self.session.finish(round) {
                            info!(
                                "Game over ({:?}): score {}, high score {}",
                                cause,
                                self.scoreboard.score(),
                                self.scoreboard.high_score()
                            );
                            events.push(GameEvent::GameOver {
                                final_score: self.scoreboard.score(),
                                high_score: self.scoreboard.high_score(),
                                cause,
                            });
                        }
                    }
                }
                self.session.is_running()
            });

        Frame {
            ticks,
            events,
            render: self.render_state(),
        }
    }

    pub fn render_state(&self) -> RenderState {
        let fraction = self.scheduler.fraction() as f32;
        RenderState {
            size: self.grid.size(),
            segments: interpolate(&self.previous, &self.grid.snapshot(), fraction),
            food: self.grid.food(),
            obstacles: self.occupants.iter().flat_map(|o| o.cells()).collect(),
            score: self.scoreboard.score(),
            high_score: self.scoreboard.high_score(),
            state: self.session.state(),
            fraction,
        }
    }

    fn new_board(&mut self) {
        self.grid = self.template.clone();
        self.grid.place_food(&self.occupants, &mut self.rng);
        self.previous = self.grid.snapshot();
        self.scheduler.reset();
    }

    #[cfg(test)]
    fn replace_grid(&mut self, grid: Grid) {
        self.previous = grid.snapshot();
        self.grid = grid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Collision;

    fn settings() -> GameSettings {
        GameSettings {
            size: Size::new(10, 10),
            ticks_per_second: 10.0,
            max_frame_delta_ms: 250.0,
            seed: Some(99),
            ..GameSettings::default()
        }
    }

    fn game() -> Game {
        Game::new(settings()).expect("valid settings")
    }

    fn canonical() -> Vec<Cell> {
        vec![
            Cell::new(5, 5),
            Cell::new(4, 5),
            Cell::new(3, 5),
            Cell::new(2, 5),
        ]
    }

    /// Runs one tick per call by stepping the clock 100 ms at a time.
    fn tick(game: &mut Game, clock: &mut f64) -> Frame {
        *clock += 100.0;
        game.frame(*clock)
    }

    fn game_overs(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    #[test]
    fn test_idle_game_does_not_tick() {
        let mut game = game();
        assert_eq!(game.state(), SessionState::Idle);
        assert_eq!(game.frame(0.0).ticks, 0);
        assert_eq!(game.frame(1000.0).ticks, 0);
        assert_eq!(game.grid().snapshot(), canonical());
    }

    #[test]
    fn test_frames_drive_ticks() {
        let mut game = game();
        assert_eq!(game.start(), vec![GameEvent::Started { round: 1 }]);
        // Park the food so the snake length stays put.
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &canonical(),
            Direction::Right,
            Some(Cell::new(0, 0)),
        ));

        assert_eq!(game.frame(0.0).ticks, 0);
        assert_eq!(game.frame(250.0).ticks, 2);
        let frame = game.frame(260.0);
        assert_eq!(frame.ticks, 0);
        assert!((frame.render.fraction - 0.6).abs() < 1e-6);

        assert_eq!(game.grid().snake().head(), Cell::new(7, 5));
        assert_eq!(game.grid().snake().len(), 4);
    }

    #[test]
    fn test_render_state_interpolates_head() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &canonical(),
            Direction::Right,
            Some(Cell::new(0, 0)),
        ));

        game.frame(0.0);
        let frame = game.frame(150.0);
        assert_eq!(frame.ticks, 1);
        let head = frame.render.head().expect("snake has a head");
        assert!((head.x - 5.5).abs() < 1e-6);
        assert!((head.y - 5.0).abs() < 1e-6);
        assert_eq!(frame.render.segments.len(), 4);
    }

    #[test]
    fn test_wall_ends_round_once() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &canonical(),
            Direction::Right,
            None,
        ));

        let mut clock = 0.0;
        game.frame(clock);
        for _ in 0..4 {
            assert!(tick(&mut game, &mut clock).events.is_empty());
        }
        assert_eq!(game.grid().snake().head(), Cell::new(9, 5));

        let frame = tick(&mut game, &mut clock);
        assert_eq!(
            frame.events,
            vec![GameEvent::GameOver {
                final_score: 0,
                high_score: 0,
                cause: Collision::Wall,
            }]
        );
        assert_eq!(game.state(), SessionState::GameOver);

        for _ in 0..5 {
            let frame = tick(&mut game, &mut clock);
            assert_eq!(frame.ticks, 0);
            assert_eq!(game_overs(&frame.events), 0);
        }
        assert_eq!(game.grid().snake().head(), Cell::new(9, 5));
    }

    #[test]
    fn test_eating_reports_score() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &[Cell::new(5, 5)],
            Direction::Right,
            Some(Cell::new(9, 5)),
        ));

        let mut clock = 0.0;
        game.frame(clock);
        let mut events = Vec::new();
        for _ in 0..4 {
            events.extend(tick(&mut game, &mut clock).events);
        }

        assert_eq!(
            events,
            vec![GameEvent::FoodEaten {
                at: Cell::new(9, 5),
                score: 10
            }]
        );
        assert_eq!(game.score(), 10);
        assert_eq!(game.high_score(), 10);
        assert_eq!(game.grid().snake().len(), 2);
        let food = game.grid().food().expect("room for food");
        assert!(!game.grid().snake().contains(food));
    }

    #[test]
    fn test_saturated_board_is_reported() {
        let mut game = Game::new(GameSettings {
            size: Size::new(3, 3),
            initial_length: 1,
            ..settings()
        })
        .expect("valid settings");
        game.start();
        // Eight cells of snake; the only free cell holds the food.
        game.replace_grid(Grid::from_parts(
            Size::new(3, 3),
            &[
                Cell::new(0, 1),
                Cell::new(0, 2),
                Cell::new(1, 2),
                Cell::new(2, 2),
                Cell::new(2, 1),
                Cell::new(1, 1),
                Cell::new(1, 0),
                Cell::new(2, 0),
            ],
            Direction::Up,
            Some(Cell::new(0, 0)),
        ));

        let mut clock = 0.0;
        game.frame(clock);
        let frame = tick(&mut game, &mut clock);
        assert_eq!(
            frame.events,
            vec![
                GameEvent::FoodEaten {
                    at: Cell::new(0, 0),
                    score: 10
                },
                GameEvent::BoardSaturated,
            ]
        );
        assert_eq!(game.grid().food(), None);
        assert_eq!(game.grid().snake().len(), 9);

        // Nowhere left to go but the wall.
        let frame = tick(&mut game, &mut clock);
        assert_eq!(game_overs(&frame.events), 1);
        assert_eq!(game.state(), SessionState::GameOver);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &canonical(),
            Direction::Right,
            None,
        ));

        game.frame(0.0);
        assert_eq!(game.frame(150.0).ticks, 1);
        assert_eq!(game.pause(), vec![GameEvent::Paused]);
        assert_eq!(game.frame(200.0).ticks, 0);
        assert_eq!(game.frame(5_000.0).ticks, 0);
        let head = game.grid().snake().head();

        assert_eq!(game.toggle_pause(), vec![GameEvent::Resumed]);
        assert_eq!(game.frame(6_000.0).ticks, 0);
        assert_eq!(game.grid().snake().head(), head);
        assert_eq!(game.frame(6_050.0).ticks, 1);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_start_is_ignored_mid_round() {
        let mut game = game();
        game.start();
        assert!(game.start().is_empty());
        game.pause();
        assert!(game.start().is_empty());
        assert_eq!(game.state(), SessionState::Paused);
    }

    #[test]
    fn test_reversal_is_refused() {
        let mut game = game();
        game.start();
        assert!(!game.set_direction(Direction::Left));
        assert_eq!(game.grid().snake().pending_direction(), Direction::Right);
        assert!(game.set_direction(Direction::Down));
    }

    #[test]
    fn test_reset_restores_initial_board() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &[Cell::new(5, 5)],
            Direction::Right,
            Some(Cell::new(6, 5)),
        ));
        let mut clock = 0.0;
        game.frame(clock);
        tick(&mut game, &mut clock);
        assert_eq!(game.score(), 10);
        assert_eq!(game.grid().snake().len(), 2);

        assert_eq!(game.reset(), vec![GameEvent::Reset]);
        assert_eq!(game.state(), SessionState::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 10);
        assert_eq!(game.grid().snapshot(), canonical());
        assert_eq!(game.grid().snake().direction(), Direction::Right);

        game.start();
        assert_eq!(game.round(), 3);
        assert_eq!(game.grid().snapshot(), canonical());
    }

    #[test]
    fn test_clear_on_reset_policy() {
        let mut game = Game::new(GameSettings {
            high_score_policy: HighScorePolicy::ClearOnReset,
            ..settings()
        })
        .expect("valid settings")
        .with_high_score(40);
        assert_eq!(game.high_score(), 40);

        game.reset();
        assert_eq!(game.high_score(), 0);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut game = game();
        game.start();
        game.replace_grid(Grid::from_parts(
            Size::new(10, 10),
            &[Cell::new(9, 5)],
            Direction::Right,
            None,
        ));
        let mut clock = 0.0;
        game.frame(clock);
        assert_eq!(game_overs(&tick(&mut game, &mut clock).events), 1);

        assert_eq!(game.start(), vec![GameEvent::Started { round: 2 }]);
        assert!(game.state() == SessionState::Running);
        assert_eq!(game.grid().snapshot(), canonical());
    }

    #[test]
    fn test_reset_with_new_settings() {
        let mut game = game().with_high_score(30);
        let events = game
            .reset_with(GameSettings {
                size: Size::new(16, 12),
                ..settings()
            })
            .expect("valid settings");
        assert_eq!(events, vec![GameEvent::Reset]);
        assert_eq!(game.grid().size(), Size::new(16, 12));
        assert_eq!(game.grid().snake().head(), Cell::new(8, 6));
        assert_eq!(game.high_score(), 30);

        let err = game
            .reset_with(GameSettings {
                size: Size::new(4, 4),
                ..settings()
            })
            .unwrap_err();
        assert!(matches!(err, SneakError::InvalidDimensions { .. }));
        assert_eq!(game.grid().size(), Size::new(16, 12));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            Game::new(GameSettings {
                ticks_per_second: 0.0,
                ..settings()
            }),
            Err(SneakError::InvalidTickRate(_))
        ));
        assert!(matches!(
            Game::new(GameSettings {
                food_reward: 0,
                ..settings()
            }),
            Err(SneakError::InvalidReward)
        ));
        assert!(matches!(
            Game::new(GameSettings {
                food_attempts: 0,
                ..settings()
            }),
            Err(SneakError::InvalidFoodAttempts)
        ));
        assert!(matches!(
            Game::new(GameSettings {
                max_frame_delta_ms: 0.0,
                ..settings()
            }),
            Err(SneakError::InvalidFrameDelta(_))
        ));
        assert!(matches!(
            Game::new(GameSettings {
                max_frame_delta_ms: f64::NAN,
                ..settings()
            }),
            Err(SneakError::InvalidFrameDelta(_))
        ));
        assert!(matches!(
            Game::new(GameSettings {
                obstacles: vec![Cell::new(10, 0)],
                ..settings()
            }),
            Err(SneakError::ObstacleOutOfBounds { x: 10, y: 0 })
        ));
    }

    #[test]
    fn test_obstacles_are_rendered_and_deadly() {
        let mut game = Game::new(GameSettings {
            obstacles: vec![Cell::new(7, 5)],
            ..settings()
        })
        .expect("valid settings");
        assert_eq!(game.render_state().obstacles, vec![Cell::new(7, 5)]);

        game.start();
        let mut clock = 0.0;
        game.frame(clock);
        let mut events = Vec::new();
        for _ in 0..2 {
            events.extend(tick(&mut game, &mut clock).events);
        }
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                cause: Collision::Obstacle,
                ..
            }
        )));
    }
}
