//! External configuration loader.
//!
//! Reads `sneak.toml` from the executable's directory or the current
//! directory. Missing files and missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use log::{warn, LevelFilter};
use serde::Deserialize;

use crate::error::{Result, SneakError};
use crate::game::{GameSettings, HighScorePolicy};
use crate::grid::{Cell, Size};
use crate::scheduler::Scheduler;

pub const CONFIG_FILE: &str = "sneak.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub general: GeneralConfig,
}

/// Board dimensions; `None` means "fit the container".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardConfig {
    pub width: Option<u16>,
    pub height: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub ticks_per_second: f64,
    pub max_frame_delta_ms: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub initial_length: u16,
    pub food_reward: u32,
    pub food_attempts: u32,
    pub high_score_policy: HighScorePolicy,
    pub seed: Option<u64>,
    pub obstacles: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralConfig {
    pub log_level: LevelFilter,
    pub high_score_file: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug, Default)]
struct TomlBoard {
    width: Option<u16>,
    height: Option<u16>,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_ticks_per_second")]
    ticks_per_second: f64,
    #[serde(default = "default_max_frame_delta")]
    max_frame_delta_ms: f64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_initial_length")]
    initial_length: u16,
    #[serde(default = "default_food_reward")]
    food_reward: u32,
    #[serde(default = "default_food_attempts")]
    food_attempts: u32,
    #[serde(default)]
    high_score_policy: HighScorePolicy,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    obstacles: Vec<[u16; 2]>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_high_score_file")]
    high_score_file: String,
}

// ── Defaults ──

// 120 ms per tick
fn default_ticks_per_second() -> f64 {
    1000.0 / 120.0
}

fn default_max_frame_delta() -> f64 {
    250.0
}

fn default_initial_length() -> u16 {
    4
}

fn default_food_reward() -> u32 {
    10
}

fn default_food_attempts() -> u32 {
    1000
}

fn default_log_level() -> String {
    "info".into()
}

fn default_high_score_file() -> String {
    ".sneak_high_score.txt".into()
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            ticks_per_second: default_ticks_per_second(),
            max_frame_delta_ms: default_max_frame_delta(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            initial_length: default_initial_length(),
            food_reward: default_food_reward(),
            food_attempts: default_food_attempts(),
            high_score_policy: HighScorePolicy::default(),
            seed: None,
            obstacles: Vec::new(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            log_level: default_log_level(),
            high_score_file: default_high_score_file(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(toml_cfg: TomlConfig) -> Self {
        let log_level = toml_cfg.general.log_level.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown log level {:?}, using info",
                toml_cfg.general.log_level
            );
            LevelFilter::Info
        });

        GameConfig {
            board: BoardConfig {
                width: toml_cfg.board.width,
                height: toml_cfg.board.height,
            },
            speed: SpeedConfig {
                ticks_per_second: toml_cfg.speed.ticks_per_second,
                max_frame_delta_ms: toml_cfg.speed.max_frame_delta_ms,
            },
            rules: RulesConfig {
                initial_length: toml_cfg.rules.initial_length,
                food_reward: toml_cfg.rules.food_reward,
                food_attempts: toml_cfg.rules.food_attempts,
                high_score_policy: toml_cfg.rules.high_score_policy,
                seed: toml_cfg.rules.seed,
                obstacles: toml_cfg
                    .rules
                    .obstacles
                    .iter()
                    .map(|&[x, y]| Cell::new(x, y))
                    .collect(),
            },
            general: GeneralConfig {
                log_level,
                high_score_file: PathBuf::from(toml_cfg.general.high_score_file),
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `sneak.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A broken file is logged and replaced by defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join(CONFIG_FILE);
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!("Could not load {}: {}", path.display(), e);
                    warn!("Using default settings.");
                    return Self::default();
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let cfg: GameConfig = toml_cfg.into();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values no board could play with. Board-dependent checks
    /// (dimensions, obstacle positions) happen when the game is built.
    pub fn validate(&self) -> Result<()> {
        Scheduler::new(self.speed.ticks_per_second, self.speed.max_frame_delta_ms)?;
        if self.rules.initial_length == 0 {
            return Err(SneakError::InvalidLength);
        }
        if self.rules.food_reward == 0 {
            return Err(SneakError::InvalidReward);
        }
        if self.rules.food_attempts == 0 {
            return Err(SneakError::InvalidFoodAttempts);
        }
        Ok(())
    }

    /// Board size, with unset dimensions taken from `available`. A
    /// configured dimension never exceeds what the terminal can show.
    pub fn board_size(&self, available: Size) -> Size {
        let fit = |configured: Option<u16>, available: u16| {
            configured.map_or(available, |n| n.min(available))
        };
        Size {
            width: fit(self.board.width, available.width),
            height: fit(self.board.height, available.height),
        }
    }

    /// Core settings for a board of the given size.
    pub fn settings(&self, available: Size) -> GameSettings {
        GameSettings {
            size: self.board_size(available),
            ticks_per_second: self.speed.ticks_per_second,
            max_frame_delta_ms: self.speed.max_frame_delta_ms,
            initial_length: self.rules.initial_length,
            food_reward: self.rules.food_reward,
            food_attempts: self.rules.food_attempts,
            high_score_policy: self.rules.high_score_policy,
            seed: self.rules.seed,
            obstacles: self.rules.obstacles.clone(),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.rules.initial_length, 4);
        assert_eq!(cfg.rules.food_reward, 10);
        assert_eq!(cfg.rules.food_attempts, 1000);
        assert_eq!(cfg.rules.high_score_policy, HighScorePolicy::PerSession);
        assert!((cfg.speed.ticks_per_second - 1000.0 / 120.0).abs() < 1e-9);
        assert_eq!(cfg.general.log_level, LevelFilter::Info);
        assert_eq!(cfg.board, BoardConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [board]
            width = 30

            [rules]
            food_reward = 25
            high_score_policy = "clear_on_reset"
            obstacles = [[1, 2], [3, 4]]
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.board.width, Some(30));
        assert_eq!(cfg.board.height, None);
        assert_eq!(cfg.rules.food_reward, 25);
        assert_eq!(cfg.rules.initial_length, 4);
        assert_eq!(cfg.rules.high_score_policy, HighScorePolicy::ClearOnReset);
        assert_eq!(cfg.rules.obstacles, vec![Cell::new(1, 2), Cell::new(3, 4)]);
    }

    #[test]
    fn test_board_size_falls_back_to_available() {
        let cfg = GameConfig::from_toml_str("[board]\nheight = 12\n").expect("valid config");
        let settings = cfg.settings(Size::new(40, 20));
        assert_eq!(settings.size, Size::new(40, 12));
        assert_eq!(settings.initial_length, 4);
    }

    #[test]
    fn test_board_size_never_exceeds_available() {
        let cfg = GameConfig::from_toml_str("[board]\nwidth = 100\nheight = 8\n")
            .expect("valid config");
        assert_eq!(cfg.board_size(Size::new(40, 20)), Size::new(40, 8));
        assert_eq!(cfg.board_size(Size::new(120, 6)), Size::new(100, 6));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            "[speed]\nmax_frame_delta_ms = 0.0\n",
            "[speed]\nmax_frame_delta_ms = -10.0\n",
            "[speed]\nmax_frame_delta_ms = inf\n",
            "[speed]\nticks_per_second = 0.0\n",
            "[speed]\nticks_per_second = 1e9\n",
            "[rules]\nfood_attempts = 0\n",
            "[rules]\nfood_reward = 0\n",
            "[rules]\ninitial_length = 0\n",
        ];
        for text in cases {
            assert!(GameConfig::from_toml_str(text).is_err(), "accepted {:?}", text);
        }

        assert!(matches!(
            GameConfig::from_toml_str("[speed]\nmax_frame_delta_ms = nan\n"),
            Err(SneakError::InvalidFrameDelta(_))
        ));
        assert!(matches!(
            GameConfig::from_toml_str("[rules]\nfood_attempts = 0\n"),
            Err(SneakError::InvalidFoodAttempts)
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_validates() {
        let path = std::env::temp_dir().join("sneak_invalid_config_test.toml");
        std::fs::write(&path, "[rules]\nfood_attempts = 0\n").expect("temp file");
        let result = GameConfig::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(SneakError::InvalidFoodAttempts)));
    }

    #[test]
    fn test_bad_log_level_falls_back_to_info() {
        let cfg = GameConfig::from_toml_str("[general]\nlog_level = \"loud\"\n")
            .expect("valid config");
        assert_eq!(cfg.general.log_level, LevelFilter::Info);

        let cfg = GameConfig::from_toml_str("[general]\nlog_level = \"debug\"\n")
            .expect("valid config");
        assert_eq!(cfg.general.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = GameConfig::from_toml_str("[speed]\nticks_per_second = \"fast\"\n")
            .unwrap_err();
        assert!(matches!(err, SneakError::Config(_)));
    }
}
