use log::debug;
use rand::rngs::StdRng;

use crate::game::{Board, GameResult, Player};

use super::strategy::{pick_column, rng_from, SearchContext, Strategy};

/// Monte Carlo configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Rollouts to run when nothing stops the search first.
    pub simulations: usize,
    /// Rollouts between best-move snapshots.
    pub snapshot_interval: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            simulations: 1000,
            snapshot_interval: 50,
        }
    }
}

/// Flat Monte Carlo: score every legal first move by the outcome of uniformly
/// random games played from it.
///
/// Candidates are sampled round-robin so that a search cut short still has
/// near-equal sample counts for every column.
#[derive(Clone)]
pub struct MonteCarloStrategy {
    player: Player,
    simulations: usize,
    snapshot_interval: usize,
    rng: StdRng,
}

impl MonteCarloStrategy {
    pub fn new(player: Player, config: &MonteCarloConfig, seed: Option<u64>) -> Self {
        MonteCarloStrategy {
            player,
            simulations: config.simulations.max(1),
            snapshot_interval: config.snapshot_interval.max(1),
            rng: rng_from(seed),
        }
    }

    /// Play `first` for this player on a private copy of `board`, then random
    /// moves for both sides until the game ends. +1 for a win, -1 for a loss.
    fn rollout(&mut self, board: &Board, first: usize) -> i32 {
        let mut sim = board.clone();
        let mut mover = self.player;
        let mut col = first;

        loop {
            let Ok(row) = sim.apply(col, mover) else {
                return 0;
            };
            match GameResult::after_move(&sim, row, col, mover) {
                GameResult::Win(winner) if winner == self.player => return 1,
                GameResult::Win(_) => return -1,
                GameResult::Draw => return 0,
                GameResult::InProgress => {}
            }
            mover = mover.opponent();
            col = pick_column(&mut self.rng, &sim.valid_moves());
        }
    }

    /// Highest-scoring candidate, ties broken uniformly at random.
    fn pick_best(&mut self, candidates: &[usize], scores: &[i32]) -> usize {
        let Some(&top) = scores.iter().max() else {
            return candidates[0];
        };
        let leaders: Vec<usize> = candidates
            .iter()
            .zip(scores)
            .filter(|&(_, &score)| score == top)
            .map(|(&col, _)| col)
            .collect();
        pick_column(&mut self.rng, &leaders)
    }
}

impl Strategy for MonteCarloStrategy {
    fn choose_move(&mut self, board: &Board, ctx: &SearchContext) -> usize {
        let candidates = board.valid_moves();
        assert!(!candidates.is_empty(), "No legal moves available");

        let mut scores = vec![0i32; candidates.len()];
        let mut completed = 0;

        while completed < self.simulations && !ctx.should_stop() {
            let slot = completed % candidates.len();
            scores[slot] += self.rollout(board, candidates[slot]);
            completed += 1;

            if completed % self.snapshot_interval == 0 {
                let best = self.pick_best(&candidates, &scores);
                ctx.publish_best(best);
                debug!(
                    "monte carlo {} after {completed} rollouts: column {best} ({:?})",
                    self.player,
                    ctx.elapsed()
                );
            }
        }

        let best = self.pick_best(&candidates, &scores);
        ctx.publish_best(best);
        debug!(
            "monte carlo {} finished {completed} rollouts, scores {:?}",
            self.player,
            candidates.iter().zip(&scores).collect::<Vec<_>>()
        );
        best
    }

    fn name(&self) -> &str {
        "MonteCarlo"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn monte_carlo(player: Player, simulations: usize, seed: u64) -> MonteCarloStrategy {
        MonteCarloStrategy::new(
            player,
            &MonteCarloConfig {
                simulations,
                snapshot_interval: 50,
            },
            Some(seed),
        )
    }

    #[test]
    fn finds_immediate_win() {
        let board = Board::from_moves(6, 7, &[0, 0, 1, 1, 2, 2]).unwrap();
        for seed in 0..3 {
            let mut strategy = monte_carlo(Player::One, 700, seed);
            assert_eq!(strategy.choose_move(&board, &SearchContext::unbounded()), 3);
        }
    }

    #[test]
    fn immediate_win_scores_every_rollout() {
        let board = Board::from_moves(6, 7, &[0, 0, 1, 1, 2, 2]).unwrap();
        let mut strategy = monte_carlo(Player::One, 1, 4);
        for _ in 0..20 {
            assert_eq!(strategy.rollout(&board, 3), 1);
        }
    }

    #[test]
    fn rollout_leaves_input_board_alone() {
        let board = Board::from_moves(6, 7, &[3, 3, 4]).unwrap();
        let before = board.clone();
        let mut strategy = monte_carlo(Player::Two, 1, 8);
        for col in board.valid_moves() {
            strategy.rollout(&board, col);
        }
        assert_eq!(board, before);
    }

    #[test]
    fn single_column_left_is_chosen() {
        let moves: Vec<usize> = (0..6).flat_map(|col| [col; 6]).collect();
        let board = Board::from_moves(6, 7, &moves).unwrap();
        let mut strategy = monte_carlo(Player::One, 100, 1);
        assert_eq!(strategy.choose_move(&board, &SearchContext::unbounded()), 6);
    }

    #[test]
    fn expired_budget_still_returns_legal_move() {
        let board = Board::standard();
        let mut strategy = monte_carlo(Player::One, 1_000_000, 2);
        let ctx = SearchContext::with_budget(Duration::ZERO);
        let col = strategy.choose_move(&board, &ctx);
        assert!(board.is_valid_move(col));
        assert_eq!(ctx.best_so_far(), Some(col));
    }

    #[test]
    fn ties_are_broken_among_leaders_only() {
        let mut strategy = monte_carlo(Player::One, 1, 11);
        let candidates = [0, 2, 4, 6];
        let scores = [3, 7, 7, -1];
        for _ in 0..50 {
            let pick = strategy.pick_best(&candidates, &scores);
            assert!(pick == 2 || pick == 4);
        }
    }
}
