use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use connect_four_engine::ai::StrategyKind;
use connect_four_engine::arena::run_series;
use connect_four_engine::config::{AppConfig, PlayerConfig};
use connect_four_engine::game::GameResult;

/// Pit one strategy against another over a series of games.
#[derive(Parser)]
#[command(name = "arena", about = "Run a Connect Four series between two strategies")]
struct Cli {
    /// Strategy under test
    #[arg(long, default_value = "alpha_beta")]
    contender: StrategyKind,

    /// Strategy it plays against
    #[arg(long, default_value = "random")]
    opponent: StrategyKind,

    /// Games with the contender moving first (and as many moving second)
    #[arg(long, default_value_t = 5)]
    games: usize,

    /// Per-move time limit for both sides, in seconds
    #[arg(long, default_value_t = 3.0)]
    time_limit: f64,

    /// Path to TOML configuration file (board and search settings)
    #[arg(long, default_value = "connect4.toml")]
    config: PathBuf,

    /// Base seed; each game derives its own from it
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.games == 0 {
        bail!("--games must be at least 1");
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let contender = PlayerConfig::new(cli.contender, Some(cli.time_limit));
    let opponent = PlayerConfig::new(cli.opponent, Some(cli.time_limit));

    println!(
        "--- {} vs {}: {} games per side ---",
        cli.contender, cli.opponent, cli.games
    );

    let record = run_series(&config, &contender, &opponent, cli.games, |game| {
        let outcome = match (game.result, game.contender_won()) {
            (GameResult::Draw, _) => "draw",
            (_, Some(true)) => "win",
            (_, Some(false)) => "loss",
            (_, None) => "unfinished",
        };
        println!(
            "Game {:>3} | contender as {} | {:<4} | {:>2} moves | {} fallbacks | {:.1}s",
            game.game + 1,
            game.contender_seat,
            outcome,
            game.moves,
            game.fallbacks,
            game.elapsed.as_secs_f64()
        );
    })
    .context("running the series")?;

    println!(
        "\nWins: {} | Draws: {} | Losses: {} | Points: {}/{}",
        record.wins,
        record.draws,
        record.losses,
        record.points(),
        record.games()
    );

    Ok(())
}
