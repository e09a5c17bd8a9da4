use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::game::{Board, Player};

use super::evaluator::WindowHeuristic;
use super::{
    AlphaBetaStrategy, FixedPatternStrategy, InteractiveStrategy, MinimaxStrategy,
    MonteCarloStrategy, MoveSource, RandomStrategy,
};

const NO_MOVE: usize = usize::MAX;

/// Time budget, cancellation flag and best-move-so-far slot for one
/// `choose_move` call.
///
/// Clones share the flag and the slot, so the turn engine can keep one
/// handle while a worker thread searches with another.
#[derive(Debug, Clone)]
pub struct SearchContext {
    budget: Option<Duration>,
    started: Instant,
    cancelled: Arc<AtomicBool>,
    best: Arc<AtomicUsize>,
}

impl SearchContext {
    /// No deadline. The search still honours `cancel`.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn with_budget(budget: Duration) -> Self {
        Self::new(Some(budget))
    }

    pub fn new(budget: Option<Duration>) -> Self {
        SearchContext {
            budget,
            started: Instant::now(),
            cancelled: Arc::new(AtomicBool::new(false)),
            best: Arc::new(AtomicUsize::new(NO_MOVE)),
        }
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// `None` without a budget, or when the budget runs past what
    /// `Instant` can represent.
    pub fn deadline(&self) -> Option<Instant> {
        self.budget
            .and_then(|budget| self.started.checked_add(budget))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the deadline has passed or the owner gave up on the search.
    pub fn should_stop(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline().is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Record the move to play if the search is stopped right now.
    pub fn publish_best(&self, col: usize) {
        self.best.store(col, Ordering::Release);
    }

    pub fn best_so_far(&self) -> Option<usize> {
        match self.best.load(Ordering::Acquire) {
            NO_MOVE => None,
            col => Some(col),
        }
    }
}

/// Universal interface for everything that can pick a column.
///
/// Implementations must not mutate the board they are given; any board used
/// for search is a private copy owned by the call.
pub trait Strategy: Send {
    /// Pick a column for the position. `ctx` carries the optional time
    /// budget; anytime strategies publish their running best move to it.
    fn choose_move(&mut self, board: &Board, ctx: &SearchContext) -> usize;

    /// Return the strategy's display name.
    fn name(&self) -> &str;

    /// Clone the strategy, current state included, into a boxed trait
    /// object. A timed search runs on such a copy.
    fn clone_strategy(&self) -> Box<dyn Strategy>;
}

/// The strategies a seat can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Fixed,
    Minimax,
    AlphaBeta,
    MonteCarlo,
    Interactive,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Random,
        StrategyKind::Fixed,
        StrategyKind::Minimax,
        StrategyKind::AlphaBeta,
        StrategyKind::MonteCarlo,
        StrategyKind::Interactive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::Fixed => "fixed",
            StrategyKind::Minimax => "minimax",
            StrategyKind::AlphaBeta => "alpha_beta",
            StrategyKind::MonteCarlo => "monte_carlo",
            StrategyKind::Interactive => "interactive",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown strategy '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Seeded RNG when `seed` is given, OS entropy otherwise.
pub fn rng_from(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Uniform pick from a non-empty list of columns.
pub(crate) fn pick_column<R: Rng>(rng: &mut R, columns: &[usize]) -> usize {
    assert!(!columns.is_empty(), "No legal moves available");
    columns[rng.random_range(0..columns.len())]
}

/// Build the strategy for `player` from configuration. Interactive seats
/// need a `source` supplied by the host.
pub fn build_strategy(
    kind: StrategyKind,
    player: Player,
    config: &AppConfig,
    seed: Option<u64>,
    source: Option<Box<dyn MoveSource>>,
) -> Result<Box<dyn Strategy>, ConfigError> {
    let heuristic = || Box::new(WindowHeuristic::new(config.board.rows, config.board.cols));

    let strategy: Box<dyn Strategy> = match kind {
        StrategyKind::Random => Box::new(RandomStrategy::from_seed(seed)),
        StrategyKind::Fixed => Box::new(FixedPatternStrategy::from_seed(seed)),
        StrategyKind::Minimax => Box::new(
            MinimaxStrategy::new(player, &config.minimax).with_heuristic(heuristic()),
        ),
        StrategyKind::AlphaBeta => Box::new(
            AlphaBetaStrategy::new(player, &config.alpha_beta).with_heuristic(heuristic()),
        ),
        StrategyKind::MonteCarlo => Box::new(MonteCarloStrategy::new(
            player,
            &config.monte_carlo,
            seed,
        )),
        StrategyKind::Interactive => {
            let source = source.ok_or_else(|| {
                ConfigError::Validation(format!(
                    "{player} is interactive but no move source was supplied"
                ))
            })?;
            Box::new(InteractiveStrategy::new(player, source))
        }
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn context_without_budget_never_expires() {
        let ctx = SearchContext::unbounded();
        assert!(!ctx.should_stop());
        assert_eq!(ctx.deadline(), None);
    }

    #[test]
    fn context_expires_after_budget() {
        let ctx = SearchContext::with_budget(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(15));
        assert!(ctx.should_stop());
    }

    #[test]
    fn huge_budget_never_expires() {
        let ctx = SearchContext::with_budget(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(!ctx.should_stop());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = SearchContext::unbounded();
        let worker = ctx.clone();
        ctx.cancel();
        assert!(worker.should_stop());
        assert!(worker.is_cancelled());
    }

    #[test]
    fn best_so_far_is_shared_between_clones() {
        let ctx = SearchContext::unbounded();
        assert_eq!(ctx.best_so_far(), None);
        let worker = ctx.clone();
        worker.publish_best(4);
        assert_eq!(ctx.best_so_far(), Some(4));
    }

    #[test]
    fn strategy_kind_parses_names() {
        assert_eq!("alpha_beta".parse(), Ok(StrategyKind::AlphaBeta));
        assert_eq!("Monte-Carlo".parse(), Ok(StrategyKind::MonteCarlo));
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
        assert!("stupid".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn build_every_non_interactive_kind() {
        let config = AppConfig::default();
        let board = Board::standard();
        for kind in StrategyKind::ALL {
            if kind == StrategyKind::Interactive {
                continue;
            }
            let mut strategy = build_strategy(kind, Player::One, &config, Some(3), None).unwrap();
            let ctx = SearchContext::with_budget(Duration::from_millis(200));
            let col = strategy.choose_move(&board, &ctx);
            assert!(board.is_valid_move(col), "{kind} chose {col}");
            assert_eq!(strategy.clone_strategy().name(), strategy.name());
        }
    }

    #[test]
    fn interactive_needs_a_source() {
        let config = AppConfig::default();
        let result = build_strategy(StrategyKind::Interactive, Player::Two, &config, None, None);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
