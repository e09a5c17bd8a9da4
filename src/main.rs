use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use connect_four_engine::ai::{MoveSource, StrategyKind};
use connect_four_engine::config::AppConfig;
use connect_four_engine::engine::{TurnEngine, TurnReport};
use connect_four_engine::game::{Board, GameResult, Player};

/// Play one game of Connect Four between two configured players.
#[derive(Parser)]
#[command(name = "connect-four", about = "Play a game of Connect Four")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "connect4.toml")]
    config: PathBuf,

    /// Player 1 strategy: random, fixed, minimax, alpha_beta, monte_carlo, interactive
    #[arg(long)]
    p1: Option<StrategyKind>,

    /// Player 2 strategy
    #[arg(long)]
    p2: Option<StrategyKind>,

    /// Per-move time limit for player 1, in seconds
    #[arg(long)]
    time_limit1: Option<f64>,

    /// Per-move time limit for player 2, in seconds
    #[arg(long)]
    time_limit2: Option<f64>,

    /// Board rows
    #[arg(long)]
    rows: Option<usize>,

    /// Board columns
    #[arg(long)]
    cols: Option<usize>,

    /// Seed for every random choice in the game
    #[arg(long)]
    seed: Option<u64>,

    /// Print the board after every move
    #[arg(long, short)]
    verbose: bool,

    /// Print each move as a JSON turn report
    #[arg(long)]
    json: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Reads columns typed on stdin for a human player.
struct StdinSource;

impl MoveSource for StdinSource {
    fn request_column(&mut self, board: &Board, player: Player) -> Option<usize> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            println!("{board}");
            print!("{player}, choose a column [0-{}]: ", board.cols() - 1);
            io::stdout().flush().ok()?;

            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            match line.trim().parse() {
                Ok(col) => return Some(col),
                Err(_) => println!("'{}' is not a column number", line.trim()),
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    // Load configuration
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(kind) = cli.p1 {
        config.player1.strategy = kind;
    }
    if let Some(kind) = cli.p2 {
        config.player2.strategy = kind;
    }
    if cli.time_limit1.is_some() {
        config.player1.time_limit_secs = cli.time_limit1;
    }
    if cli.time_limit2.is_some() {
        config.player2.time_limit_secs = cli.time_limit2;
    }
    // A human cannot be cut off mid-thought.
    for player in Player::BOTH {
        let seat = config.player_mut(player);
        if seat.strategy == StrategyKind::Interactive {
            seat.time_limit_secs = None;
        }
    }
    if let Some(rows) = cli.rows {
        config.board.rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.board.cols = cols;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let sources = Player::BOTH.map(|player| {
        (config.player(player).strategy == StrategyKind::Interactive)
            .then(|| Box::new(StdinSource) as Box<dyn MoveSource>)
    });
    let mut engine =
        TurnEngine::from_config(&config, sources).context("setting up the game")?;

    println!(
        "{} ({}) vs {} ({}) on a {}x{} board",
        Player::One,
        config.player1.strategy,
        Player::Two,
        config.player2.strategy,
        config.board.rows,
        config.board.cols
    );

    let result = engine
        .play_with(|report| print_turn(report, cli.verbose, cli.json))
        .context("playing the game")?;

    if !cli.verbose {
        println!("{}", engine.board());
    }
    match result {
        GameResult::Win(winner) => println!("{winner} wins after {} moves", engine.turn()),
        GameResult::Draw => println!("Draw after {} moves", engine.turn()),
        GameResult::InProgress => unreachable!("play returns only terminal results"),
    }

    Ok(())
}

fn print_turn(report: &TurnReport, verbose: bool, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("Error: failed to encode turn report: {err}"),
        }
    }
    if verbose {
        let note = report
            .fallback
            .map_or(String::new(), |reason| format!(" [{reason}]"));
        println!(
            "{} played column {} in {:.3}s{note}",
            report.player,
            report.column,
            report.elapsed.as_secs_f64()
        );
        for row in &report.board {
            let cells: Vec<String> = row.iter().map(u8::to_string).collect();
            println!("{}", cells.join(" "));
        }
        println!();
    }
}
