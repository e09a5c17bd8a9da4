//! Four-in-a-row detection.
//!
//! [`check_win_at`] is the incremental check run after every drop, in live
//! play and at search nodes. [`check_win_anywhere`] scans the whole board and
//! is only for positions whose last move is unknown.

use super::board::{Board, Cell};
use super::player::Player;

/// Length of a winning line.
pub const CONNECT: usize = 4;

/// Horizontal, vertical, and the two diagonals, as (row step, col step).
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A line of four on-grid cells as (row, col) pairs.
pub type Window = [(usize, usize); CONNECT];

/// Every four-cell window of a `rows` x `cols` grid, each exactly once.
pub fn windows(rows: usize, cols: usize) -> impl Iterator<Item = Window> {
    DIRECTIONS.into_iter().flat_map(move |(dr, dc)| {
        (0..rows).flat_map(move |row| {
            (0..cols).filter_map(move |col| window_from(rows, cols, row as isize, col as isize, dr, dc))
        })
    })
}

fn window_from(
    rows: usize,
    cols: usize,
    row: isize,
    col: isize,
    dr: isize,
    dc: isize,
) -> Option<Window> {
    let last = CONNECT as isize - 1;
    let (end_row, end_col) = (row + dr * last, col + dc * last);
    let on_grid = |r: isize, c: isize| r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols;
    if !on_grid(row, col) || !on_grid(end_row, end_col) {
        return None;
    }

    let mut cells = [(0, 0); CONNECT];
    for (i, cell) in cells.iter_mut().enumerate() {
        let i = i as isize;
        *cell = ((row + dr * i) as usize, (col + dc * i) as usize);
    }
    Some(cells)
}

fn window_is(board: &Board, window: &Window, player: Player) -> bool {
    window
        .iter()
        .all(|&(r, c)| board.get(r, c) == Cell::Occupied(player))
}

/// Whether `(row, col)` is part of four consecutive `player` cells. Only the
/// windows passing through that cell are examined.
pub fn check_win_at(board: &Board, row: usize, col: usize, player: Player) -> bool {
    if board.get(row, col) != Cell::Occupied(player) {
        return false;
    }

    DIRECTIONS.iter().any(|&(dr, dc)| {
        (0..CONNECT as isize).any(|back| {
            let start_row = row as isize - dr * back;
            let start_col = col as isize - dc * back;
            window_from(board.rows(), board.cols(), start_row, start_col, dr, dc)
                .is_some_and(|window| window_is(board, &window, player))
        })
    })
}

/// Whether `player` has four in a row anywhere on the board.
pub fn check_win_anywhere(board: &Board, player: Player) -> bool {
    windows(board.rows(), board.cols()).any(|window| window_is(board, &window, player))
}
