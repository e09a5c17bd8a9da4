use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::ai::{SearchContext, Strategy};
use crate::game::Board;

/// How a budgeted search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The strategy returned before the deadline. The column is unchecked.
    Finished(usize),
    /// The deadline passed first; `best` is whatever the strategy published.
    TimedOut { best: Option<usize> },
    /// The worker died or could not be started.
    Failed,
}

/// Run `choose_move` on a worker thread against a snapshot of `board` and
/// wait at most `budget` for it.
///
/// The worker owns a clone of `strategy`. When it answers in time the clone,
/// with whatever state the search left in it, replaces `strategy`. On expiry
/// the worker is told to stop and then abandoned, not joined; `strategy` is
/// left as it was, so the next turn never waits on a late worker.
pub fn run_with_deadline(
    strategy: &mut Box<dyn Strategy>,
    board: &Board,
    budget: Duration,
) -> SearchOutcome {
    let ctx = SearchContext::with_budget(budget);
    let worker_ctx = ctx.clone();
    let mut worker_strategy = strategy.clone_strategy();
    let snapshot = board.clone();
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name("strategy-search".into())
        .spawn(move || {
            let col = worker_strategy.choose_move(&snapshot, &worker_ctx);
            let _ = tx.send((col, worker_strategy));
        });
    if let Err(err) = spawned {
        warn!("failed to spawn search worker: {err}");
        return SearchOutcome::Failed;
    }

    match rx.recv_timeout(budget) {
        Ok((col, searched)) => {
            *strategy = searched;
            SearchOutcome::Finished(col)
        }
        Err(RecvTimeoutError::Timeout) => {
            ctx.cancel();
            SearchOutcome::TimedOut {
                best: ctx.best_so_far(),
            }
        }
        Err(RecvTimeoutError::Disconnected) => SearchOutcome::Failed,
    }
}
