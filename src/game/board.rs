use std::fmt;

use crate::error::MoveError;

use super::player::Player;

pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_COLS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Occupied(Player),
}

impl Cell {
    /// Export encoding: 0 for empty, otherwise the player's position.
    pub fn as_u8(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(player) => player.position(),
        }
    }
}

/// The grid, per-column fill pointers and the move history of each side.
///
/// Row 0 is the top; pieces land on the highest-numbered empty row. Search
/// code mutates a board through strictly paired [`Board::apply`] /
/// [`Board::undo`] calls and never copies it per node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    /// Number of pieces stacked in each column.
    heights: Vec<usize>,
    history: [Vec<usize>; 2],
}

impl Board {
    /// Create a new empty board
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "board needs at least one row and column");
        Board {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
            heights: vec![0; cols],
            history: [Vec::new(), Vec::new()],
        }
    }

    /// The classic 6x7 board.
    pub fn standard() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }

    /// Build a board by replaying columns, alternating sides from player 1.
    /// Wins are not checked, so play can continue past four in a row.
    pub fn from_moves(rows: usize, cols: usize, moves: &[usize]) -> Result<Self, MoveError> {
        let mut board = Board::new(rows, cols);
        let mut player = Player::One;
        for &col in moves {
            board.apply(col, player)?;
            player = player.opponent();
        }
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The middle column (left of centre for even widths).
    pub fn center_col(&self) -> usize {
        self.cols / 2
    }

    /// Get the cell at a specific position
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    /// Next free row index in `col`: `rows - 1` for an empty column, `-1`
    /// once it is full.
    pub fn column_fill(&self, col: usize) -> isize {
        self.rows as isize - 1 - self.heights[col] as isize
    }

    /// Row the next piece dropped in `col` would land on.
    pub fn next_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols || self.heights[col] == self.rows {
            None
        } else {
            Some(self.rows - 1 - self.heights[col])
        }
    }

    pub fn is_valid_move(&self, col: usize) -> bool {
        self.next_row(col).is_some()
    }

    /// Drop a piece for `player`; returns the row it landed on.
    pub fn apply(&mut self, col: usize, player: Player) -> Result<usize, MoveError> {
        if col >= self.cols {
            return Err(MoveError::OutOfRange {
                column: col,
                cols: self.cols,
            });
        }
        let row = self.next_row(col).ok_or(MoveError::ColumnFull(col))?;

        self.cells[row * self.cols + col] = player.to_cell();
        self.heights[col] += 1;
        self.history[player.index()].push(col);
        Ok(row)
    }

    /// Reverse the most recent `apply` on `col`.
    ///
    /// # Panics
    ///
    /// Panics if the column is empty or out of range. Undoing anything other
    /// than the latest move of the piece's owner corrupts the history and is
    /// caught by a debug assertion.
    pub fn undo(&mut self, col: usize) {
        assert!(
            col < self.cols && self.heights[col] > 0,
            "undo on empty or out-of-range column {col}"
        );
        let row = self.rows - self.heights[col];
        let idx = row * self.cols + col;
        let player = match self.cells[idx] {
            Cell::Occupied(player) => player,
            Cell::Empty => unreachable!("top of a non-empty column is empty"),
        };

        self.cells[idx] = Cell::Empty;
        self.heights[col] -= 1;
        let popped = self.history[player.index()].pop();
        debug_assert_eq!(
            popped,
            Some(col),
            "undo({col}) does not reverse the last move of {player}"
        );
    }

    /// Columns that still have room, in ascending order.
    pub fn valid_moves(&self) -> Vec<usize> {
        (0..self.cols).filter(|&col| self.is_valid_move(col)).collect()
    }

    pub fn move_count(&self) -> usize {
        self.history[0].len() + self.history[1].len()
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        self.move_count() == self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.move_count() == 0
    }

    /// Columns played by `player`, oldest first.
    pub fn history(&self, player: Player) -> &[usize] {
        &self.history[player.index()]
    }

    /// Row-major export, `0` empty, `1`/`2` for the players.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.as_u8()).collect())
            .collect()
    }

    /// Whether the fill pointers, grid and history agree with each other.
    pub fn is_consistent(&self) -> bool {
        let occupied = self.cells.iter().filter(|&&c| c != Cell::Empty).count();
        if occupied != self.move_count() {
            return false;
        }

        for col in 0..self.cols {
            if self.heights[col] > self.rows {
                return false;
            }
            for row in 0..self.rows {
                let filled = self.get(row, col) != Cell::Empty;
                if filled != (row as isize > self.column_fill(col)) {
                    return false;
                }
            }
        }

        Player::BOTH.iter().all(|&player| {
            let placed = self
                .cells
                .iter()
                .filter(|&&c| c == Cell::Occupied(player))
                .count();
            placed == self.history[player.index()].len()
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line: Vec<String> = (0..self.cols)
                .map(|col| self.get(row, col).as_u8().to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        let footer: Vec<String> = (0..self.cols).map(|col| (col % 10).to_string()).collect();
        write!(f, "{}", footer.join(" "))
    }
}
