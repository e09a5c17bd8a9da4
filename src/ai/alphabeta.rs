use std::time::{Duration, Instant};

use log::debug;

use crate::error::SearchError;
use crate::game::{check_win_at, Board, Player};

use super::evaluator::{terminal_score, Heuristic, WindowHeuristic, WIN_SCORE};
use super::strategy::{SearchContext, Strategy};

/// Ordering bonus for a column that wins on the spot.
const WIN_BONUS: i32 = 10_000;
/// Ordering bonus for a column the opponent would win with.
const BLOCK_BONUS: i32 = 5_000;
/// Share of an external budget the search allows itself before giving up.
const BUDGET_SHARE: f64 = 0.9;

/// Alpha-beta configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AlphaBetaConfig {
    /// Deepest iteration of the iterative-deepening loop.
    pub max_depth: usize,
    /// Self-imposed limit, applied even when the seat has no budget.
    pub soft_time_limit_secs: f64,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        AlphaBetaConfig {
            max_depth: 8,
            soft_time_limit_secs: 2.8,
        }
    }
}

/// Seconds to a `Duration`, saturating where `Duration` runs out.
fn soft_limit(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// When a search has to stop, checked at every node entry.
struct Limits<'a> {
    ctx: &'a SearchContext,
    soft_deadline: Option<Instant>,
}

impl Limits<'_> {
    fn check(&self) -> Result<(), SearchError> {
        let soft_expired = self
            .soft_deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        if soft_expired || self.ctx.should_stop() {
            Err(SearchError::Timeout)
        } else {
            Ok(())
        }
    }
}

/// Iterative-deepening alpha-beta with centre-first, win-first move ordering.
///
/// Each depth restarts from a full window; the move kept is the one from the
/// deepest iteration that finished. A depth abandoned half way contributes
/// nothing.
#[derive(Clone)]
pub struct AlphaBetaStrategy {
    player: Player,
    max_depth: usize,
    soft_limit: Duration,
    heuristic: Box<dyn Heuristic>,
    nodes: u64,
}

impl AlphaBetaStrategy {
    pub fn new(player: Player, config: &AlphaBetaConfig) -> Self {
        AlphaBetaStrategy {
            player,
            max_depth: config.max_depth.max(1),
            soft_limit: soft_limit(config.soft_time_limit_secs),
            heuristic: Box::new(WindowHeuristic::default()),
            nodes: 0,
        }
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Nodes visited by the most recent iteration.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// One alpha-beta search to exactly `depth` with no time limit. Returns
    /// the chosen column and its minimax value.
    pub fn search_depth(&mut self, board: &Board, depth: usize) -> Option<(usize, i32)> {
        let ctx = SearchContext::unbounded();
        let limits = Limits {
            ctx: &ctx,
            soft_deadline: None,
        };
        let mut work = board.clone();
        self.nodes = 0;
        self.search_root(&mut work, depth.max(1), &limits).ok().flatten()
    }

    fn soft_deadline(&self, ctx: &SearchContext) -> Option<Instant> {
        let allowed = match ctx.budget() {
            Some(budget) => self.soft_limit.min(budget.mul_f64(BUDGET_SHARE)),
            None => self.soft_limit,
        };
        ctx.started().checked_add(allowed)
    }

    fn search_root(
        &mut self,
        board: &mut Board,
        depth: usize,
        limits: &Limits<'_>,
    ) -> Result<Option<(usize, i32)>, SearchError> {
        let mut alpha = i32::MIN;
        let mut best: Option<(usize, i32)> = None;

        for col in order_moves(board, self.player) {
            let Ok(row) = board.apply(col, self.player) else {
                continue;
            };
            let value = match terminal_value(board, row, col, self.player, self.player, depth - 1) {
                Some(value) => Ok(value),
                None => self.alpha_beta(board, self.player.opponent(), depth - 1, alpha, i32::MAX, limits),
            };
            board.undo(col);
            let value = value?;

            if best.map_or(true, |(_, score)| value > score) {
                best = Some((col, value));
            }
            alpha = alpha.max(value);
        }

        Ok(best)
    }

    /// Value of the position with `to_move` on turn and `depth` plies left.
    /// The parent has already ruled out that the previous move ended the game.
    fn alpha_beta(
        &mut self,
        board: &mut Board,
        to_move: Player,
        depth: usize,
        mut alpha: i32,
        mut beta: i32,
        limits: &Limits<'_>,
    ) -> Result<i32, SearchError> {
        limits.check()?;
        self.nodes += 1;

        if depth == 0 {
            return Ok(self.heuristic.evaluate(board, self.player));
        }

        let maximizing = to_move == self.player;
        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        let mut searched = false;

        for col in order_moves(board, to_move) {
            let Ok(row) = board.apply(col, to_move) else {
                continue;
            };
            let value = match terminal_value(board, row, col, to_move, self.player, depth - 1) {
                Some(value) => Ok(value),
                None => self.alpha_beta(board, to_move.opponent(), depth - 1, alpha, beta, limits),
            };
            board.undo(col);
            let value = value?;
            searched = true;

            if maximizing {
                best = best.max(value);
                alpha = alpha.max(best);
            } else {
                best = best.min(value);
                beta = beta.min(best);
            }
            if alpha >= beta {
                break;
            }
        }

        Ok(if searched { best } else { 0 })
    }
}

/// Win or draw value of the move just played, if it ended the game.
fn terminal_value(
    board: &Board,
    row: usize,
    col: usize,
    mover: Player,
    perspective: Player,
    remaining: usize,
) -> Option<i32> {
    if check_win_at(board, row, col, mover) {
        Some(terminal_score(perspective, mover, remaining))
    } else if board.is_full() {
        Some(0)
    } else {
        None
    }
}

/// Whether dropping a `player` piece in `col` makes four in a row.
fn completes_line(board: &mut Board, col: usize, player: Player) -> bool {
    match board.apply(col, player) {
        Ok(row) => {
            let wins = check_win_at(board, row, col, player);
            board.undo(col);
            wins
        }
        Err(_) => false,
    }
}

/// Legal columns, most promising first: immediate wins, then blocks, then
/// closeness to the centre. Ties keep ascending column order.
fn order_moves(board: &mut Board, player: Player) -> Vec<usize> {
    let cols = board.cols() as i32;
    let center = board.center_col() as i32;

    let mut scored: Vec<(i32, usize)> = board
        .valid_moves()
        .into_iter()
        .map(|col| {
            let mut score = (cols - (center - col as i32).abs()) * 3;
            if completes_line(board, col, player) {
                score += WIN_BONUS;
            }
            if completes_line(board, col, player.opponent()) {
                score += BLOCK_BONUS;
            }
            (score, col)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, col)| col).collect()
}

impl Strategy for AlphaBetaStrategy {
    fn choose_move(&mut self, board: &Board, ctx: &SearchContext) -> usize {
        assert!(!board.valid_moves().is_empty(), "No legal moves available");

        if board.is_empty() && board.is_valid_move(board.center_col()) {
            ctx.publish_best(board.center_col());
            return board.center_col();
        }

        let mut work = board.clone();
        let limits = Limits {
            ctx,
            soft_deadline: self.soft_deadline(ctx),
        };

        // Until depth 1 completes, the best-ordered column stands in.
        let mut best = order_moves(&mut work, self.player)[0];
        ctx.publish_best(best);

        let empty_cells = board.rows() * board.cols() - board.move_count();
        let max_depth = self.max_depth.min(empty_cells);

        for depth in 1..=max_depth {
            self.nodes = 0;
            match self.search_root(&mut work, depth, &limits) {
                Ok(Some((col, score))) => {
                    best = col;
                    ctx.publish_best(col);
                    debug!(
                        "alpha-beta {} depth {depth}: column {col} score {score} ({} nodes, {:?})",
                        self.player,
                        self.nodes,
                        ctx.elapsed()
                    );
                    if score >= WIN_SCORE {
                        break;
                    }
                }
                Ok(None) => break,
                Err(SearchError::Timeout) => {
                    debug!(
                        "alpha-beta {} abandoned depth {depth} after {:?}",
                        self.player,
                        ctx.elapsed()
                    );
                    break;
                }
            }
        }

        debug_assert_eq!(&work, board, "search left the board modified");
        best
    }

    fn name(&self) -> &str {
        "AlphaBeta"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}
