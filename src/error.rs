use std::path::PathBuf;

use crate::game::Player;

/// A column that cannot be played on the current board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {column} is out of range (board has {cols} columns)")]
    OutOfRange { column: usize, cols: usize },

    #[error("column {0} is full")]
    ColumnFull(usize),
}

/// Raised inside a search when its deadline passes or it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search deadline exceeded")]
    Timeout,
}

/// Calls the host made that the turn engine refuses. The board is untouched
/// whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("the game is already over")]
    GameOver,

    #[error("{0} is driven by a strategy and cannot take an external move")]
    NotExternalTurn(Player),

    #[error("{0} is driven externally and has no strategy to ask")]
    NotStrategyTurn(Player),

    #[error("waiting for an external move from {0}")]
    AwaitingExternal(Player),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that stop a multi-game series.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("game {game} aborted: {source}")]
    Engine {
        game: usize,
        #[source]
        source: EngineError,
    },
}
