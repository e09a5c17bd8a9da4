use log::debug;

use crate::error::SearchError;
use crate::game::{check_win_at, Board, Player};

use super::evaluator::{terminal_score, Heuristic, WindowHeuristic};
use super::strategy::{SearchContext, Strategy};

/// Minimax configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    /// Plies searched below the root.
    pub depth: usize,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        MinimaxConfig { depth: 4 }
    }
}

/// Plain fixed-depth minimax without pruning.
///
/// Leaves are scored from this player's side with the heuristic; the
/// opponent's plies minimise that score. The search checks its context at
/// every node and unwinds once told to stop. A stopped search has no result
/// worth keeping and publishes nothing.
#[derive(Clone)]
pub struct MinimaxStrategy {
    player: Player,
    depth: usize,
    heuristic: Box<dyn Heuristic>,
}

impl MinimaxStrategy {
    pub fn new(player: Player, config: &MinimaxConfig) -> Self {
        MinimaxStrategy {
            player,
            depth: config.depth.max(1),
            heuristic: Box::new(WindowHeuristic::default()),
        }
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Search every legal column to the configured depth and return the
    /// first column with the highest value, with that value.
    pub fn best_move(&self, board: &Board) -> Option<(usize, i32)> {
        self.search_root(board, &SearchContext::unbounded())
            .ok()
            .flatten()
    }

    fn search_root(
        &self,
        board: &Board,
        ctx: &SearchContext,
    ) -> Result<Option<(usize, i32)>, SearchError> {
        let mut board = board.clone();
        let mut best: Option<(usize, i32)> = None;

        for col in board.valid_moves() {
            let Ok(row) = board.apply(col, self.player) else {
                continue;
            };
            let value = self.minimax(&mut board, row, col, self.player, self.depth - 1, ctx);
            board.undo(col);
            let value = value?;

            if best.map_or(true, |(_, score)| value > score) {
                best = Some((col, value));
            }
        }

        Ok(best)
    }

    /// Value of the position reached by `mover` landing a piece on
    /// `(row, col)`, with `depth` plies left to search.
    fn minimax(
        &self,
        board: &mut Board,
        row: usize,
        col: usize,
        mover: Player,
        depth: usize,
        ctx: &SearchContext,
    ) -> Result<i32, SearchError> {
        if ctx.should_stop() {
            return Err(SearchError::Timeout);
        }
        if check_win_at(board, row, col, mover) {
            return Ok(terminal_score(self.player, mover, depth));
        }
        if board.is_full() {
            return Ok(0);
        }
        if depth == 0 {
            return Ok(self.heuristic.evaluate(board, self.player));
        }

        let to_move = mover.opponent();
        let maximizing = to_move == self.player;
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for next in board.valid_moves() {
            let Ok(next_row) = board.apply(next, to_move) else {
                continue;
            };
            let value = self.minimax(board, next_row, next, to_move, depth - 1, ctx);
            board.undo(next);
            let value = value?;

            best = if maximizing {
                best.max(value)
            } else {
                best.min(value)
            };
        }

        Ok(best)
    }
}

impl Strategy for MinimaxStrategy {
    fn choose_move(&mut self, board: &Board, ctx: &SearchContext) -> usize {
        let legal = board.valid_moves();
        assert!(!legal.is_empty(), "No legal moves available");

        if board.is_empty() && board.is_valid_move(board.center_col()) {
            return board.center_col();
        }

        match self.search_root(board, ctx) {
            Ok(best) => best.map_or(legal[0], |(col, _)| col),
            Err(SearchError::Timeout) => {
                debug!(
                    "minimax {} stopped after {:?} without a result",
                    self.player,
                    ctx.elapsed()
                );
                legal[0]
            }
        }
    }

    fn name(&self) -> &str {
        "Minimax"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}
