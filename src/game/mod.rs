//! Core Connect Four game logic: board representation with apply/undo
//! mutation, player identity, four-in-a-row detection and game results.

mod board;
mod player;
mod state;
pub mod win;

pub use board::{Board, Cell, DEFAULT_COLS, DEFAULT_ROWS};
pub use player::Player;
pub use state::GameResult;
pub use win::{check_win_anywhere, check_win_at};
