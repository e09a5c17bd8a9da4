use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, TryLockError};

use log::warn;

use crate::game::{Board, Player};

use super::strategy::{SearchContext, Strategy};

/// Something outside the engine that can be asked for a column: a console
/// prompt, a GUI click, an HTTP request.
pub trait MoveSource: Send {
    /// Block until a column is offered. `None` means the source is closed
    /// and will never offer one.
    fn request_column(&mut self, board: &Board, player: Player) -> Option<usize>;
}

/// Columns pushed by a host through a channel.
pub struct ChannelSource {
    rx: Receiver<usize>,
}

impl ChannelSource {
    /// The sender half goes to whoever produces the moves.
    pub fn new() -> (Sender<usize>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, ChannelSource { rx })
    }
}

impl MoveSource for ChannelSource {
    fn request_column(&mut self, _board: &Board, _player: Player) -> Option<usize> {
        self.rx.recv().ok()
    }
}

/// Delegates every decision to a [`MoveSource`], re-asking until the
/// offered column is legal.
///
/// Clones share the source. Only one of them can wait on it at a time.
#[derive(Clone)]
pub struct InteractiveStrategy {
    player: Player,
    source: Arc<Mutex<Box<dyn MoveSource>>>,
}

impl InteractiveStrategy {
    pub fn new(player: Player, source: Box<dyn MoveSource>) -> Self {
        InteractiveStrategy {
            player,
            source: Arc::new(Mutex::new(source)),
        }
    }
}

impl Strategy for InteractiveStrategy {
    /// A closed or busy source yields an out-of-range column, which the turn
    /// engine replaces with a random legal move.
    fn choose_move(&mut self, board: &Board, _ctx: &SearchContext) -> usize {
        let mut source = match self.source.try_lock() {
            Ok(source) => source,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("{}: move source is still answering an earlier turn", self.player);
                return board.cols();
            }
        };
        loop {
            match source.request_column(board, self.player) {
                Some(col) if board.is_valid_move(col) => return col,
                Some(col) => warn!("{}: column {col} is full or out of range", self.player),
                None => {
                    warn!("{}: move source closed", self.player);
                    return board.cols();
                }
            }
        }
    }

    fn name(&self) -> &str {
        "Interactive"
    }

    fn clone_strategy(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn skips_illegal_columns_until_a_legal_one() {
        let (tx, source) = ChannelSource::new();
        let mut strategy = InteractiveStrategy::new(Player::One, Box::new(source));
        let board = Board::from_moves(6, 7, &[0; 6]).unwrap();

        tx.send(0).unwrap();
        tx.send(42).unwrap();
        tx.send(5).unwrap();
        assert_eq!(strategy.choose_move(&board, &SearchContext::unbounded()), 5);
    }

    #[test]
    fn closed_source_yields_out_of_range_column() {
        let (tx, source) = ChannelSource::new();
        drop(tx);
        let mut strategy = InteractiveStrategy::new(Player::Two, Box::new(source));
        let board = Board::standard();
        let col = strategy.choose_move(&board, &SearchContext::unbounded());
        assert!(!board.is_valid_move(col));
    }

    #[test]
    fn busy_source_does_not_block_a_clone() {
        let (tx, source) = ChannelSource::new();
        let strategy = InteractiveStrategy::new(Player::One, Box::new(source));
        let board = Board::standard();

        let mut waiting = strategy.clone_strategy();
        let worker_board = board.clone();
        let worker = thread::spawn(move || {
            waiting.choose_move(&worker_board, &SearchContext::unbounded())
        });
        // Give the worker time to take the source.
        thread::sleep(Duration::from_millis(100));

        let mut other = strategy.clone_strategy();
        let col = other.choose_move(&board, &SearchContext::unbounded());
        assert!(!board.is_valid_move(col));

        tx.send(2).unwrap();
        assert_eq!(worker.join().unwrap(), 2);
    }
}
