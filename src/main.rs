//! Lasker Morris referee.
//!
//! ## Usage
//!
//! - `lasker-referee lasker --player1 "<cmd>" --player2 "<cmd>"` - Referee one match
//! - `lasker-referee tictactoe --player "<cmd>" [--player2 "<cmd>"]` - Referee one
//!   tic-tac-toe match; player 2 defaults to the same program
//!
//! Player 1 plays blue unless `--random-colors` is given. Logging goes to
//! stderr and is controlled with `RUST_LOG`; the terminal line is printed to
//! stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lasker_referee::config::{MatchConfig, PlayerCommand};
use lasker_referee::referee::Referee;
use lasker_referee::rules::{GameRules, LaskerMorris};
use lasker_referee::tictactoe::TicTacToe;

/// Lasker Morris referee for two player programs
#[derive(Parser)]
#[command(name = "lasker-referee")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Referee a Lasker Morris match
    Lasker(LaskerArgs),
    /// Referee a tic-tac-toe match
    Tictactoe(TicTacToeArgs),
}

#[derive(Args)]
struct LaskerArgs {
    /// Command line launching player 1
    #[arg(long)]
    player1: PlayerCommand,

    /// Command line launching player 2
    #[arg(long)]
    player2: PlayerCommand,

    #[command(flatten)]
    options: MatchOptions,
}

#[derive(Args)]
struct TicTacToeArgs {
    /// Command line launching player 1
    #[arg(long)]
    player: PlayerCommand,

    /// Command line launching player 2 (defaults to --player)
    #[arg(long)]
    player2: Option<PlayerCommand>,

    #[command(flatten)]
    options: MatchOptions,
}

#[derive(Args)]
struct MatchOptions {
    /// Seconds each player gets per move
    #[arg(long, default_value_t = 5.0)]
    timeout: f64,

    /// Toss a coin for which player is blue
    #[arg(long)]
    random_colors: bool,

    /// Write a timestamped log of each player's traffic into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Write the final board and move history as JSON
    #[arg(long)]
    history_out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("lasker_referee=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lasker(args) => run_match(
            args.player1,
            args.player2,
            args.options,
            Box::new(LaskerMorris::new()),
        ),
        Commands::Tictactoe(args) => {
            let player2 = args.player2.unwrap_or_else(|| args.player.clone());
            run_match(args.player, player2, args.options, Box::new(TicTacToe::new()))
        }
    }
}

fn run_match(
    player1: PlayerCommand,
    player2: PlayerCommand,
    options: MatchOptions,
    rules: Box<dyn GameRules>,
) -> anyhow::Result<()> {
    let mut config = MatchConfig::new(player1, player2);
    config.move_timeout = Duration::try_from_secs_f64(options.timeout)
        .context("--timeout must be a positive number")?;
    config.random_colors = options.random_colors;
    config.log_dir = options.log_dir;
    config.history_out = options.history_out;
    config.validate()?;

    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }

    let mut referee = Referee::from_config(&config, rules);
    let result = referee.run()?;

    println!("{}", result.message);
    if let Some(detail) = &result.detail {
        println!("Reason: {detail}");
    }

    if let Some(path) = &config.history_out {
        referee
            .watch()
            .get()
            .write_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
