use std::path::Path;
use std::time::Duration;

use log::warn;

use crate::ai::{AlphaBetaConfig, MinimaxConfig, MonteCarloConfig, StrategyKind};
use crate::error::ConfigError;
use crate::game::{Player, DEFAULT_COLS, DEFAULT_ROWS};

/// Board geometry, fixed for the lifetime of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

/// Who sits in one seat and how long they get per move.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerConfig {
    pub strategy: StrategyKind,
    /// Per-move budget in seconds. Unset means the strategy is never cut off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<f64>,
}

impl PlayerConfig {
    pub fn new(strategy: StrategyKind, time_limit_secs: Option<f64>) -> Self {
        PlayerConfig {
            strategy,
            time_limit_secs,
        }
    }

    /// The budget as a `Duration`. A value `Duration` cannot hold reads as
    /// no limit; [`AppConfig::validate`] rejects such values.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Master seed. Unset means OS entropy everywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub board: BoardConfig,
    pub player1: PlayerConfig,
    pub player2: PlayerConfig,
    pub minimax: MinimaxConfig,
    pub alpha_beta: AlphaBetaConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            seed: None,
            board: BoardConfig::default(),
            player1: PlayerConfig::new(StrategyKind::Interactive, None),
            player2: PlayerConfig::new(StrategyKind::AlphaBeta, Some(3.0)),
            minimax: MinimaxConfig::default(),
            alpha_beta: AlphaBetaConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn player(&self, player: Player) -> &PlayerConfig {
        match player {
            Player::One => &self.player1,
            Player::Two => &self.player2,
        }
    }

    pub fn player_mut(&mut self, player: Player) -> &mut PlayerConfig {
        match player {
            Player::One => &mut self.player1,
            Player::Two => &mut self.player2,
        }
    }

    /// Seed for `player`'s strategy: the master seed offset by the seat.
    pub fn seed_for(&self, player: Player) -> Option<u64> {
        self.seed
            .map(|seed| seed.wrapping_add(u64::from(player.position())))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.rows == 0 || self.board.cols == 0 {
            return Err(ConfigError::Validation(
                "board.rows and board.cols must be >= 1".into(),
            ));
        }

        for player in Player::BOTH {
            let seat = self.player(player);
            let section = format!("player{}", player.position());
            if let Some(limit) = seat.time_limit_secs {
                if !is_positive_duration(limit) {
                    return Err(ConfigError::Validation(format!(
                        "{section}.time_limit_secs must be a number of seconds > 0, got {limit}"
                    )));
                }
                if seat.strategy == StrategyKind::Interactive {
                    return Err(ConfigError::Validation(format!(
                        "{section} is interactive and cannot have a time limit"
                    )));
                }
            }
        }

        if self.minimax.depth == 0 {
            return Err(ConfigError::Validation(
                "minimax.depth must be >= 1".into(),
            ));
        }
        if self.alpha_beta.max_depth == 0 {
            return Err(ConfigError::Validation(
                "alpha_beta.max_depth must be >= 1".into(),
            ));
        }
        let soft = self.alpha_beta.soft_time_limit_secs;
        if !is_positive_duration(soft) {
            return Err(ConfigError::Validation(format!(
                "alpha_beta.soft_time_limit_secs must be a number of seconds > 0, got {soft}"
            )));
        }
        if self.monte_carlo.simulations == 0 {
            return Err(ConfigError::Validation(
                "monte_carlo.simulations must be >= 1".into(),
            ));
        }
        if self.monte_carlo.snapshot_interval == 0 {
            return Err(ConfigError::Validation(
                "monte_carlo.snapshot_interval must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

/// Positive, and small enough to be held by a `Duration`.
fn is_positive_duration(secs: f64) -> bool {
    secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
}
