use crate::game::win::{windows, Window};
use crate::game::{Board, Cell, Player, DEFAULT_COLS, DEFAULT_ROWS};

/// Magnitude of a decided game in search scores. Kept far above anything
/// the heuristic can produce.
pub const WIN_SCORE: i32 = 1_000_000;

/// Score of a position where `mover` has just completed four in a row,
/// seen from `perspective`. Larger `remaining` depth means a faster result.
pub fn terminal_score(perspective: Player, mover: Player, remaining: usize) -> i32 {
    let score = WIN_SCORE + remaining as i32;
    if mover == perspective {
        score
    } else {
        -score
    }
}

/// Trait for evaluating a board position from a player's perspective.
pub trait Heuristic: Send {
    fn evaluate(&self, board: &Board, player: Player) -> i32;

    /// Clone the heuristic into a boxed trait object.
    fn clone_heuristic(&self) -> Box<dyn Heuristic>;
}

impl Clone for Box<dyn Heuristic> {
    fn clone(&self) -> Self {
        self.clone_heuristic()
    }
}

/// Scans all 4-cell windows and scores threats for one side only.
///
/// | window                     | score |
/// |----------------------------|-------|
/// | four own                   | +100  |
/// | three own, one empty       | +5    |
/// | two own, two empty         | +2    |
/// | three opponent, one empty  | -4    |
/// | two opponent, two empty    | -1    |
///
/// plus +3 for every own piece in the centre column.
#[derive(Debug, Clone)]
pub struct WindowHeuristic {
    rows: usize,
    cols: usize,
    windows: Vec<Window>,
}

impl WindowHeuristic {
    const CENTER_PIECE: i32 = 3;

    /// Precompute the windows for one board geometry. Boards of any other
    /// size are still scored, just without the cache.
    pub fn new(rows: usize, cols: usize) -> Self {
        WindowHeuristic {
            rows,
            cols,
            windows: windows(rows, cols).collect(),
        }
    }

    fn score_window(own: usize, opp: usize, empty: usize) -> i32 {
        match (own, opp, empty) {
            (4, _, _) => 100,
            (3, 0, 1) => 5,
            (2, 0, 2) => 2,
            (0, 3, 1) => -4,
            (0, 2, 2) => -1,
            _ => 0,
        }
    }

    fn score(board: &Board, player: Player, windows: impl IntoIterator<Item = Window>) -> i32 {
        let own_cell = Cell::Occupied(player);
        let center = board.center_col();
        let mut score = (0..board.rows())
            .filter(|&row| board.get(row, center) == own_cell)
            .count() as i32
            * Self::CENTER_PIECE;

        for window in windows {
            let (mut own, mut opp, mut empty) = (0, 0, 0);
            for (row, col) in window {
                match board.get(row, col) {
                    Cell::Empty => empty += 1,
                    c if c == own_cell => own += 1,
                    _ => opp += 1,
                }
            }
            score += Self::score_window(own, opp, empty);
        }

        score
    }
}

impl Default for WindowHeuristic {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Heuristic for WindowHeuristic {
    fn evaluate(&self, board: &Board, player: Player) -> i32 {
        if (board.rows(), board.cols()) == (self.rows, self.cols) {
            Self::score(board, player, self.windows.iter().copied())
        } else {
            Self::score(board, player, windows(board.rows(), board.cols()))
        }
    }

    fn clone_heuristic(&self) -> Box<dyn Heuristic> {
        Box::new(self.clone())
    }
}
