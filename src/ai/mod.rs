mod alphabeta;
pub mod evaluator;
mod fixed;
mod interactive;
pub mod minimax;
mod montecarlo;
mod random;
mod strategy;

pub use alphabeta::{AlphaBetaConfig, AlphaBetaStrategy};
pub use evaluator::{Heuristic, WindowHeuristic, WIN_SCORE};
pub use fixed::{FixedPatternStrategy, DEFAULT_ORDER};
pub use interactive::{ChannelSource, InteractiveStrategy, MoveSource};
pub use minimax::{MinimaxConfig, MinimaxStrategy};
pub use montecarlo::{MonteCarloConfig, MonteCarloStrategy};
pub use random::RandomStrategy;
pub use strategy::{build_strategy, rng_from, SearchContext, Strategy, StrategyKind};
pub(crate) use strategy::pick_column;
