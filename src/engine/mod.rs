//! Turn orchestration: whose move it is, asking the right seat, replacing
//! bad or late answers, and applying the result to the live board.

mod timeout;

pub use timeout::{run_with_deadline, SearchOutcome};

use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::rngs::StdRng;

use crate::ai::{
    build_strategy, pick_column, rng_from, MoveSource, SearchContext, Strategy, StrategyKind,
};
use crate::config::AppConfig;
use crate::error::{ConfigError, EngineError};
use crate::game::{check_win_anywhere, Board, GameResult, Player};

/// Who answers for one side of the board.
pub enum Seat {
    /// Moves arrive from the host through [`TurnEngine::apply_external_move`].
    External,
    /// Moves come from a strategy, optionally under a per-move budget.
    Strategy {
        strategy: Box<dyn Strategy>,
        time_limit: Option<Duration>,
    },
}

impl Seat {
    pub fn external() -> Self {
        Seat::External
    }

    pub fn strategy(strategy: Box<dyn Strategy>, time_limit: Option<Duration>) -> Self {
        Seat::Strategy {
            strategy,
            time_limit,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Seat::External)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        match self {
            Seat::External => None,
            Seat::Strategy { time_limit, .. } => *time_limit,
        }
    }
}

impl fmt::Debug for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::External => f.write_str("External"),
            Seat::Strategy { time_limit, .. } => f
                .debug_struct("Strategy")
                .field("time_limit", time_limit)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingMove(Player),
    Terminal(GameResult),
}

/// Why the applied column is not the one the seat asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    IllegalMove,
    Timeout,
    WorkerFailed,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FallbackReason::IllegalMove => "illegal move",
            FallbackReason::Timeout => "timeout",
            FallbackReason::WorkerFailed => "worker failed",
        };
        f.write_str(reason)
    }
}

/// A column checked against the live board. Only the engine makes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValidatedMove(usize);

/// What the host gets back after every applied move. Serializes to
/// `{"move", "board", "game_over", "winner"}` plus `fallback` when one fired.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TurnReport {
    #[serde(rename = "move")]
    pub column: usize,
    #[serde(skip)]
    pub player: Player,
    pub board: Vec<Vec<u8>>,
    pub game_over: bool,
    pub winner: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Drives one game on one board.
///
/// The live board is only ever mutated here, one validated move at a time.
/// Strategies see snapshots.
pub struct TurnEngine {
    board: Board,
    seats: [Seat; 2],
    state: TurnState,
    turn: usize,
    rng: StdRng,
}

impl TurnEngine {
    /// Start from `board`, which may already hold moves; the side to move
    /// follows from the piece count.
    pub fn new(board: Board, seats: [Seat; 2], seed: Option<u64>) -> Self {
        let state = initial_state(&board);
        TurnEngine {
            turn: board.move_count(),
            board,
            seats,
            state,
            rng: rng_from(seed),
        }
    }

    /// Build both seats from configuration. An interactive seat given a
    /// source becomes an [`crate::ai::InteractiveStrategy`]; one without a
    /// source is left to the host as [`Seat::External`].
    pub fn from_config(
        config: &AppConfig,
        sources: [Option<Box<dyn MoveSource>>; 2],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let [source1, source2] = sources;
        let seats = [
            build_seat(config, Player::One, source1)?,
            build_seat(config, Player::Two, source2)?,
        ];
        let board = Board::new(config.board.rows, config.board.cols);
        Ok(TurnEngine::new(board, seats, config.seed))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Number of moves applied so far.
    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn seat(&self, player: Player) -> &Seat {
        &self.seats[player.index()]
    }

    /// The side on move, or `None` once the game is over.
    pub fn to_move(&self) -> Option<Player> {
        match self.state {
            TurnState::AwaitingMove(player) => Some(player),
            TurnState::Terminal(_) => None,
        }
    }

    pub fn result(&self) -> GameResult {
        match self.state {
            TurnState::AwaitingMove(_) => GameResult::InProgress,
            TurnState::Terminal(result) => result,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, TurnState::Terminal(_))
    }

    /// Apply a host-supplied column for an [`Seat::External`] side. An
    /// illegal column is replaced by a random legal one.
    pub fn apply_external_move(&mut self, column: usize) -> Result<TurnReport, EngineError> {
        let player = self.awaiting()?;
        if !self.seat(player).is_external() {
            return Err(EngineError::NotExternalTurn(player));
        }

        let started = Instant::now();
        let (validated, fallback) = self.validate(player, column);
        Ok(self.commit(player, validated, fallback, started))
    }

    /// Ask the strategy on move for a column and apply it, substituting a
    /// fallback for illegal answers, timeouts, and dead workers.
    pub fn request_ai_move(&mut self) -> Result<TurnReport, EngineError> {
        let player = self.awaiting()?;
        let Seat::Strategy {
            strategy,
            time_limit,
        } = &mut self.seats[player.index()]
        else {
            return Err(EngineError::NotStrategyTurn(player));
        };

        let started = Instant::now();
        let outcome = match *time_limit {
            Some(budget) => run_with_deadline(strategy, &self.board, budget),
            None => SearchOutcome::Finished(
                strategy.choose_move(&self.board, &SearchContext::unbounded()),
            ),
        };
        debug_assert!(self.board.is_consistent());

        let (validated, fallback) = match outcome {
            SearchOutcome::Finished(col) => self.validate(player, col),
            SearchOutcome::TimedOut { best } => {
                let validated = match best.and_then(|col| self.check(col)) {
                    Some(validated) => {
                        warn!("{player} ran out of time, playing its best column so far");
                        validated
                    }
                    None => {
                        warn!("{player} ran out of time with no move, playing a random column");
                        self.random_move()
                    }
                };
                (validated, Some(FallbackReason::Timeout))
            }
            SearchOutcome::Failed => {
                warn!("{player} search worker failed, playing a random column");
                (self.random_move(), Some(FallbackReason::WorkerFailed))
            }
        };

        Ok(self.commit(player, validated, fallback, started))
    }

    /// Take the next turn, whoever's it is. Fails without touching the board
    /// when the side on move is external.
    pub fn play_turn(&mut self) -> Result<TurnReport, EngineError> {
        let player = self.awaiting()?;
        if self.seat(player).is_external() {
            return Err(EngineError::AwaitingExternal(player));
        }
        self.request_ai_move()
    }

    /// Play turns until the game ends.
    pub fn play(&mut self) -> Result<GameResult, EngineError> {
        self.play_with(|_| {})
    }

    /// Like [`TurnEngine::play`], handing every report to `on_turn`.
    pub fn play_with<F>(&mut self, mut on_turn: F) -> Result<GameResult, EngineError>
    where
        F: FnMut(&TurnReport),
    {
        while let TurnState::AwaitingMove(_) = self.state {
            let report = self.play_turn()?;
            on_turn(&report);
        }
        Ok(self.result())
    }

    /// Empty the board and hand the first move back to player 1. Seats and
    /// their strategies are kept.
    pub fn reset(&mut self) {
        self.board = Board::new(self.board.rows(), self.board.cols());
        self.state = TurnState::AwaitingMove(Player::One);
        self.turn = 0;
    }

    fn awaiting(&self) -> Result<Player, EngineError> {
        match self.state {
            TurnState::AwaitingMove(player) => Ok(player),
            TurnState::Terminal(_) => Err(EngineError::GameOver),
        }
    }

    fn check(&self, column: usize) -> Option<ValidatedMove> {
        self.board.is_valid_move(column).then_some(ValidatedMove(column))
    }

    fn validate(&mut self, player: Player, column: usize) -> (ValidatedMove, Option<FallbackReason>) {
        match self.check(column) {
            Some(validated) => (validated, None),
            None => {
                warn!("{player} chose illegal column {column}, playing a random column");
                (self.random_move(), Some(FallbackReason::IllegalMove))
            }
        }
    }

    /// Non-terminal states always have an open column.
    fn random_move(&mut self) -> ValidatedMove {
        ValidatedMove(pick_column(&mut self.rng, &self.board.valid_moves()))
    }

    fn commit(
        &mut self,
        player: Player,
        ValidatedMove(column): ValidatedMove,
        fallback: Option<FallbackReason>,
        started: Instant,
    ) -> TurnReport {
        let row = self
            .board
            .apply(column, player)
            .expect("validated column is playable");
        self.turn += 1;

        let result = GameResult::after_move(&self.board, row, column, player);
        self.state = if result.is_terminal() {
            TurnState::Terminal(result)
        } else {
            TurnState::AwaitingMove(player.opponent())
        };

        let elapsed = started.elapsed();
        info!(
            "turn {}: {player} plays column {column} in {:.3}s{}",
            self.turn,
            elapsed.as_secs_f64(),
            fallback.map_or(String::new(), |reason| format!(" ({reason})"))
        );
        if let TurnState::Terminal(result) = self.state {
            match result.winner() {
                Some(winner) => info!("{winner} wins after {} moves", self.turn),
                None => info!("draw after {} moves", self.turn),
            }
        }

        TurnReport {
            column,
            player,
            board: self.board.to_rows(),
            game_over: result.is_terminal(),
            winner: result.winner_code(),
            fallback,
            elapsed,
        }
    }
}

fn build_seat(
    config: &AppConfig,
    player: Player,
    source: Option<Box<dyn MoveSource>>,
) -> Result<Seat, ConfigError> {
    let seat = config.player(player);
    if seat.strategy == StrategyKind::Interactive && source.is_none() {
        return Ok(Seat::External);
    }
    let strategy = build_strategy(seat.strategy, player, config, config.seed_for(player), source)?;
    Ok(Seat::strategy(strategy, seat.time_limit()))
}

fn initial_state(board: &Board) -> TurnState {
    for player in Player::BOTH {
        if check_win_anywhere(board, player) {
            return TurnState::Terminal(GameResult::Win(player));
        }
    }
    if board.is_full() {
        return TurnState::Terminal(GameResult::Draw);
    }
    let to_move = if board.move_count() % 2 == 0 {
        Player::One
    } else {
        Player::Two
    };
    TurnState::AwaitingMove(to_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{
        ChannelSource, FixedPatternStrategy, MinimaxConfig, MinimaxStrategy, RandomStrategy,
    };
    use crate::config::PlayerConfig;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns whatever columns it is scripted with, legal or not.
    #[derive(Clone)]
    struct Garbage {
        rng: StdRng,
    }

    impl Strategy for Garbage {
        fn choose_move(&mut self, _board: &Board, _ctx: &SearchContext) -> usize {
            match self.rng.random_range(0..3) {
                0 => usize::MAX,
                1 => self.rng.random_range(0..20),
                _ => self.rng.random_range(0..7),
            }
        }

        fn name(&self) -> &str {
            "Garbage"
        }

        fn clone_strategy(&self) -> Box<dyn Strategy> {
            Box::new(self.clone())
        }
    }

    struct Sleeper;

    impl Strategy for Sleeper {
        fn choose_move(&mut self, board: &Board, _ctx: &SearchContext) -> usize {
            std::thread::sleep(Duration::from_millis(500));
            board.valid_moves()[0]
        }

        fn name(&self) -> &str {
            "Sleeper"
        }

        fn clone_strategy(&self) -> Box<dyn Strategy> {
            Box::new(Sleeper)
        }
    }

    /// Slow on its first call only. Clones share the call count.
    #[derive(Clone)]
    struct SlowFirstCall {
        calls: Arc<AtomicUsize>,
    }

    impl Strategy for SlowFirstCall {
        fn choose_move(&mut self, board: &Board, _ctx: &SearchContext) -> usize {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(Duration::from_millis(400));
            }
            board.valid_moves()[0]
        }

        fn name(&self) -> &str {
            "SlowFirstCall"
        }

        fn clone_strategy(&self) -> Box<dyn Strategy> {
            Box::new(self.clone())
        }
    }

    fn external_pair() -> TurnEngine {
        TurnEngine::new(Board::standard(), [Seat::external(), Seat::external()], Some(0))
    }

    #[test]
    fn starts_with_player_one() {
        let engine = external_pair();
        assert_eq!(engine.state(), TurnState::AwaitingMove(Player::One));
        assert_eq!(engine.turn(), 0);
    }

    #[test]
    fn external_moves_alternate() {
        let mut engine = external_pair();
        let report = engine.apply_external_move(3).unwrap();
        assert_eq!(report.column, 3);
        assert_eq!(report.player, Player::One);
        assert!(!report.game_over);
        assert_eq!(report.board[5][3], 1);
        assert_eq!(engine.to_move(), Some(Player::Two));
    }

    #[test]
    fn illegal_external_move_is_replaced() {
        let board = Board::from_moves(6, 7, &[0; 6]).unwrap();
        let mut engine = TurnEngine::new(board, [Seat::external(), Seat::external()], Some(1));
        let report = engine.apply_external_move(0).unwrap();
        assert_ne!(report.column, 0);
        assert_eq!(report.fallback, Some(FallbackReason::IllegalMove));
        assert_eq!(engine.board().move_count(), 7);
    }

    #[test]
    fn out_of_turn_calls_are_rejected() {
        let seats = [
            Seat::external(),
            Seat::strategy(Box::new(RandomStrategy::with_seed(0)), None),
        ];
        let mut engine = TurnEngine::new(Board::standard(), seats, Some(0));

        assert_eq!(
            engine.request_ai_move(),
            Err(EngineError::NotStrategyTurn(Player::One))
        );
        assert_eq!(
            engine.play_turn(),
            Err(EngineError::AwaitingExternal(Player::One))
        );
        assert!(engine.board().is_empty());

        engine.apply_external_move(3).unwrap();
        assert_eq!(
            engine.apply_external_move(3),
            Err(EngineError::NotExternalTurn(Player::Two))
        );
        assert_eq!(engine.board().move_count(), 1);
        engine.request_ai_move().unwrap();
        assert_eq!(engine.to_move(), Some(Player::One));
    }

    #[test]
    fn terminal_state_is_absorbing() {
        let mut engine = external_pair();
        for col in [3, 0, 3, 0, 3, 0] {
            engine.apply_external_move(col).unwrap();
        }
        let report = engine.apply_external_move(3).unwrap();
        assert!(report.game_over);
        assert_eq!(report.winner, 1);
        assert_eq!(engine.result(), GameResult::Win(Player::One));
        assert_eq!(engine.apply_external_move(1), Err(EngineError::GameOver));
        assert_eq!(engine.play_turn(), Err(EngineError::GameOver));
        assert_eq!(engine.board().move_count(), 7);
    }

    #[test]
    fn garbage_strategies_never_break_the_board() {
        for seed in 0..20 {
            let seats = [
                Seat::strategy(
                    Box::new(Garbage {
                        rng: StdRng::seed_from_u64(seed),
                    }),
                    None,
                ),
                Seat::strategy(
                    Box::new(Garbage {
                        rng: StdRng::seed_from_u64(seed + 100),
                    }),
                    None,
                ),
            ];
            let mut engine = TurnEngine::new(Board::standard(), seats, Some(seed));
            let result = engine
                .play_with(|report| {
                    assert!(report.column < 7);
                })
                .unwrap();
            assert!(result.is_terminal());
            assert!(engine.board().is_consistent());
            assert_eq!(engine.turn(), engine.board().move_count());
        }
    }

    #[test]
    fn slow_strategy_falls_back_on_timeout() {
        let seats = [
            Seat::strategy(Box::new(Sleeper), Some(Duration::from_millis(40))),
            Seat::external(),
        ];
        let mut engine = TurnEngine::new(Board::standard(), seats, Some(3));
        let started = Instant::now();
        let report = engine.request_ai_move().unwrap();
        assert!(started.elapsed() < Duration::from_millis(450));
        assert_eq!(report.fallback, Some(FallbackReason::Timeout));
        assert!(report.column < 7);
        assert_eq!(engine.board().move_count(), 1);
    }

    #[test]
    fn each_timed_turn_gets_its_own_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seats = [
            Seat::strategy(
                Box::new(SlowFirstCall {
                    calls: Arc::clone(&calls),
                }),
                Some(Duration::from_millis(100)),
            ),
            Seat::external(),
        ];
        let mut engine = TurnEngine::new(Board::standard(), seats, Some(8));

        let first = engine.request_ai_move().unwrap();
        assert_eq!(first.fallback, Some(FallbackReason::Timeout));
        engine.apply_external_move(6).unwrap();

        // The first worker is still asleep while this turn runs.
        let second = engine.request_ai_move().unwrap();
        assert_eq!(second.fallback, None);
        assert_eq!(second.column, 0);
        assert!(second.elapsed < Duration::from_millis(100));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn timed_minimax_seat_answers_within_its_budget() {
        let seats = [
            Seat::strategy(
                Box::new(MinimaxStrategy::new(Player::One, &MinimaxConfig { depth: 7 })),
                Some(Duration::from_millis(50)),
            ),
            Seat::external(),
        ];
        let board = Board::from_moves(6, 7, &[3, 3]).unwrap();
        let mut engine = TurnEngine::new(board, seats, Some(2));

        for reply in [0, 6, 0, 6] {
            let report = engine.request_ai_move().unwrap();
            assert!(report.elapsed < Duration::from_millis(300));
            assert!(matches!(
                report.fallback,
                None | Some(FallbackReason::Timeout)
            ));
            assert!(engine.board().is_consistent());
            if engine.is_over() {
                break;
            }
            engine.apply_external_move(reply).unwrap();
            if engine.is_over() {
                break;
            }
        }
    }

    #[test]
    fn timed_out_minimax_falls_back_to_a_random_column() {
        let board = Board::from_moves(6, 7, &[6, 0, 6, 1, 5, 2]).unwrap();
        let seats = [
            Seat::strategy(
                Box::new(MinimaxStrategy::new(Player::One, &MinimaxConfig { depth: 9 })),
                Some(Duration::from_millis(40)),
            ),
            Seat::external(),
        ];
        let mut engine = TurnEngine::new(board.clone(), seats, Some(5));
        let started = Instant::now();
        let report = engine.request_ai_move().unwrap();
        assert!(started.elapsed() < Duration::from_millis(300));
        assert_eq!(report.fallback, Some(FallbackReason::Timeout));
        assert!(board.is_valid_move(report.column));
    }

    #[test]
    fn fixed_pattern_game_is_reproducible() {
        let play = || {
            let seats = [
                Seat::strategy(Box::new(FixedPatternStrategy::from_seed(Some(1))), None),
                Seat::strategy(Box::new(RandomStrategy::with_seed(2)), None),
            ];
            let mut engine = TurnEngine::new(Board::standard(), seats, Some(0));
            let result = engine.play().unwrap();
            (result, engine.board().clone())
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn reset_keeps_seats() {
        let seats = [
            Seat::strategy(Box::new(RandomStrategy::with_seed(5)), None),
            Seat::strategy(Box::new(RandomStrategy::with_seed(6)), Some(Duration::from_secs(1))),
        ];
        let mut engine = TurnEngine::new(Board::new(4, 5), seats, None);
        engine.play().unwrap();
        engine.reset();
        assert!(engine.board().is_empty());
        assert_eq!(engine.board().cols(), 5);
        assert_eq!(engine.state(), TurnState::AwaitingMove(Player::One));
        assert_eq!(engine.seat(Player::Two).time_limit(), Some(Duration::from_secs(1)));
        assert!(engine.play().unwrap().is_terminal());
    }

    #[test]
    fn resumes_from_a_position() {
        let board = Board::from_moves(6, 7, &[3, 3, 2]).unwrap();
        let engine = TurnEngine::new(board, [Seat::external(), Seat::external()], None);
        assert_eq!(engine.to_move(), Some(Player::Two));
        assert_eq!(engine.turn(), 3);
    }

    #[test]
    fn from_config_leaves_sourceless_interactive_seat_external() {
        let mut config = AppConfig::default();
        config.seed = Some(4);
        config.player2 = PlayerConfig::new(StrategyKind::Fixed, None);
        let engine = TurnEngine::from_config(&config, [None, None]).unwrap();
        assert!(engine.seat(Player::One).is_external());
        assert!(!engine.seat(Player::Two).is_external());
    }

    #[test]
    fn from_config_rejects_time_limit_too_large_for_a_duration() {
        let mut config = AppConfig::default();
        config.player2.time_limit_secs = Some(1e20);
        let result = TurnEngine::from_config(&config, [None, None]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn from_config_wires_channel_source() {
        let mut config = AppConfig::default();
        config.player2 = PlayerConfig::new(StrategyKind::Fixed, None);
        let (tx, source) = ChannelSource::new();
        let mut engine = TurnEngine::from_config(&config, [Some(Box::new(source)), None]).unwrap();

        tx.send(6).unwrap();
        let report = engine.play_turn().unwrap();
        assert_eq!(report.column, 6);
        assert_eq!(report.player, Player::One);
        let reply = engine.play_turn().unwrap();
        assert_eq!(reply.column, 3);
    }

    #[test]
    fn closed_source_falls_back_to_random() {
        let mut config = AppConfig::default();
        config.player2 = PlayerConfig::new(StrategyKind::Fixed, None);
        let (tx, source) = ChannelSource::new();
        drop(tx);
        let mut engine = TurnEngine::from_config(&config, [Some(Box::new(source)), None]).unwrap();
        let report = engine.play_turn().unwrap();
        assert_eq!(report.fallback, Some(FallbackReason::IllegalMove));
    }
}
