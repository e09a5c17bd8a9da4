use rand::rngs::StdRng;

use crate::game::Board;

use super::strategy::{pick_column, rng_from, SearchContext, Strategy};

/// Column preference of the deterministic baseline. Column 4 is left out on
/// purpose: it is only ever reached through the random fallback.
pub const DEFAULT_ORDER: [usize; 6] = [3, 2, 1, 5, 6, 0];

/// Plays the first open column from a fixed preference list, falling back
/// to a random legal column once every preferred column is full.
#[derive(Clone)]
pub struct FixedPatternStrategy {
    order: Vec<usize>,
    rng: StdRng,
}

impl FixedPatternStrategy {
    pub fn new() -> Self {
        Self::from_seed(None)
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        FixedPatternStrategy {
            order: DEFAULT_ORDER.to_vec(),
            rng: rng_from(seed),
        }
    }

    pub fn with_order(order: Vec<usize>, seed: Option<u64>) -> Self {
        FixedPatternStrategy {
            order,
            rng: rng_from(seed),
        }
    }
}

impl Default for FixedPatternStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for FixedPatternStrategy {
    fn choose_move(&mut self, board: &Board, _ctx: &SearchContext) -> usize {
        match self.order.iter().copied().find(|&col| board.is_valid_move(col)) {
            Some(col) => col,
            None => pick_column(&mut self.rng, &board.valid_moves()),
        }
    }

    fn name(&self) -> &str {
        "Fixed"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}
