use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::Board;

use super::strategy::{pick_column, rng_from, SearchContext, Strategy};

/// A strategy that selects uniformly at random from legal columns.
#[derive(Clone)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new() -> Self {
        RandomStrategy {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomStrategy {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        RandomStrategy { rng: rng_from(seed) }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn choose_move(&mut self, board: &Board, _ctx: &SearchContext) -> usize {
        pick_column(&mut self.rng, &board.valid_moves())
    }

    fn name(&self) -> &str {
        "Random"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}
