//! goban-engine: an authoritative Go rules engine.
//!
//! ## Usage
//!
//! - `goban-engine gtp` - Referee a game over GTP on stdin/stdout
//! - `goban-engine demo` - Play a random game and print the result
//! - `goban-engine --config engine.toml ...` - Load settings from TOML
//!
//! Logs go to stderr; set `RUST_LOG` to override the configured filter.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use goban_engine::config::EngineConfig;
use goban_engine::gtp::GtpEngine;
use goban_engine::playout::{max_game_len, random_game};
use goban_engine::session::SessionCoordinator;
use goban_engine::wire::StateView;

/// goban-engine: Go rules engine
#[derive(Parser)]
#[command(name = "goban-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Referee a game over the Go Text Protocol
    Gtp {
        /// Board size (9, 13 or 19); defaults to the configured size
        #[arg(long)]
        size: Option<usize>,
    },
    /// Play a random game and print the final position
    Demo {
        /// Board size (9, 13 or 19); defaults to the configured size
        #[arg(long)]
        size: Option<usize>,
        /// Seed for the random move generator
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Stop after this many moves and passes
        #[arg(long)]
        moves: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let coordinator = SessionCoordinator::from_config(&config);

    match cli.command {
        Some(Commands::Gtp { size }) => {
            let size = size.unwrap_or(config.default_board_size);
            let mut engine = GtpEngine::new(coordinator, size)?;
            info!(size, "Starting GTP session");
            engine.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Some(Commands::Demo { size, seed, moves }) => {
            let size = size.unwrap_or(config.default_board_size);
            run_demo(&coordinator, size, seed, moves)?;
        }
        None => run_demo(&coordinator, config.default_board_size, 1, None)?,
    }
    Ok(())
}

fn run_demo(
    coordinator: &SessionCoordinator,
    size: usize,
    seed: u64,
    moves: Option<usize>,
) -> Result<()> {
    let (id, _) = coordinator.create_game(size)?;
    let mut rng = fastrand::Rng::with_seed(seed);
    let limit = moves.unwrap_or_else(|| max_game_len(size));
    let state = random_game(coordinator, id, limit, &mut rng)?;

    println!("goban-engine: random game {id} on {size}x{size} (seed {seed})\n");
    println!("{}", state.board());
    println!(
        "moves: {}  captures black: {}  white: {}  outcome: {:?}",
        state.move_number(),
        state.captures().black,
        state.captures().white,
        state.outcome()
    );
    println!("{}", serde_json::to_string_pretty(&StateView::from(&*state))?);
    Ok(())
}
