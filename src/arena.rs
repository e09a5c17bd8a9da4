use std::time::Duration;

use log::info;

use crate::ai::StrategyKind;
use crate::config::{AppConfig, PlayerConfig};
use crate::engine::TurnEngine;
use crate::error::{ArenaError, ConfigError};
use crate::game::{GameResult, Player};

/// One finished series game, seen from the contender's side.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    /// Zero-based index across the whole series.
    pub game: usize,
    pub contender_seat: Player,
    pub result: GameResult,
    pub moves: usize,
    /// Turns where the engine had to substitute a move.
    pub fallbacks: usize,
    pub elapsed: Duration,
}

impl GameRecord {
    /// `Some(true)` if the contender won, `Some(false)` if it lost, `None`
    /// for a draw.
    pub fn contender_won(&self) -> Option<bool> {
        self.result
            .winner()
            .map(|winner| winner == self.contender_seat)
    }
}

/// Running win/draw/loss tally for the contender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeriesRecord {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

impl SeriesRecord {
    pub fn record(&mut self, game: &GameRecord) {
        match game.contender_won() {
            Some(true) => self.wins += 1,
            Some(false) => self.losses += 1,
            None => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.wins + self.draws + self.losses
    }

    /// A win is worth a point and a draw half of one.
    pub fn points(&self) -> f64 {
        self.wins as f64 + self.draws as f64 * 0.5
    }
}

/// Derive a deterministic seed for a given game index.
pub fn game_seed(base_seed: u64, game_index: usize) -> u64 {
    // FNV-style mixing so neighbouring games get unrelated streams
    let mut hash = base_seed ^ 0x517cc1b727220a95;
    let index = game_index as u64;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= index >> 32;
    hash
}

/// Play `games_per_side` games with the contender moving first and as many
/// with it moving second, against the same opponent.
///
/// Board geometry and search tunables come from `base`. With a base seed,
/// every game gets its own derived seed, so an untimed series replays
/// exactly. `on_game` sees each game as it finishes.
pub fn run_series<F>(
    base: &AppConfig,
    contender: &PlayerConfig,
    opponent: &PlayerConfig,
    games_per_side: usize,
    mut on_game: F,
) -> Result<SeriesRecord, ArenaError>
where
    F: FnMut(&GameRecord),
{
    for seat in [contender, opponent] {
        if seat.strategy == StrategyKind::Interactive {
            return Err(ConfigError::Validation(
                "series games cannot include interactive players".into(),
            )
            .into());
        }
    }

    let mut record = SeriesRecord::default();
    let mut game = 0;

    for round in 0..games_per_side {
        for contender_seat in Player::BOTH {
            let mut config = base.clone();
            config.seed = base.seed.map(|seed| game_seed(seed, game));
            *config.player_mut(contender_seat) = contender.clone();
            *config.player_mut(contender_seat.opponent()) = opponent.clone();

            let mut engine = TurnEngine::from_config(&config, [None, None])?;
            let mut fallbacks = 0;
            let mut elapsed = Duration::ZERO;
            let result = engine
                .play_with(|report| {
                    elapsed += report.elapsed;
                    if report.fallback.is_some() {
                        fallbacks += 1;
                    }
                })
                .map_err(|source| ArenaError::Engine { game, source })?;

            let finished = GameRecord {
                game,
                contender_seat,
                result,
                moves: engine.turn(),
                fallbacks,
                elapsed,
            };
            record.record(&finished);
            info!(
                "round {} game {}: contender as {contender_seat} -> {:?} in {} moves",
                round + 1,
                game + 1,
                result,
                finished.moves
            );
            on_game(&finished);
            game += 1;
        }
    }

    Ok(record)
}
