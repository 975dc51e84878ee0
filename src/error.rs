use thiserror::Error;

/// Errors raised while building a game. Nothing here happens during play.
#[derive(Debug, Error)]
pub enum SneakError {
    #[error("board {width}x{height} is too small for a snake of length {initial_length}")]
    InvalidDimensions {
        width: u16,
        height: u16,
        initial_length: u16,
    },
    #[error("initial snake length must be at least 1")]
    InvalidLength,
    #[error("ticks per second must be in (0, 1000], got {0}")]
    InvalidTickRate(f64),
    #[error("max frame delta must be a positive finite number of ms, got {0}")]
    InvalidFrameDelta(f64),
    #[error("food placement needs at least one attempt")]
    InvalidFoodAttempts,
    #[error("food reward must be non-zero")]
    InvalidReward,
    #[error("obstacle at ({x}, {y}) lies outside the board")]
    ObstacleOutOfBounds { x: u16, y: u16 },
    #[error("obstacle at ({x}, {y}) overlaps the starting snake")]
    BlockedStart { x: u16, y: u16 },
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SneakError>;
