//! # count-solver
//!
//! `count-solver` plays Minesweeper with a set-count constraint propagation
//! engine. Every revealed cell becomes a constraint "exactly `n` of these
//! neighbours are mines"; the engine simplifies and resolves those constraints
//! against each other to find cells that are certainly safe or certainly
//! mines, and the agent only guesses when nothing is certain.
//!
//! ## Usage
//!
//! ```sh
//! count-solver [SUBCOMMAND] [OPTIONS]
//! ```
//!
//! ### Subcommands
//!
//! 1.  **`play`**: Play one game on a random board.
//!     ```sh
//!     count-solver play --height 8 --width 8 --mines 8 --print-board
//!     ```
//!
//! 2.  **`simulate`**: Play many games and report the win rate.
//!     ```sh
//!     count-solver simulate --games 1000 --seed 42
//!     ```
//!
//! 3.  **`completions`**: Generate shell completions.
//!     ```sh
//!     count-solver completions bash
//!     ```
//!
//! ### Common Options
//!
//! -   `-d, --debug`: Log every move and propagation pass.
//! -   `--no-stats`: Skip the statistics table.
//! -   `--chooser <random|first>`: Move selection among equally good candidates.
//! -   `--seed <N>`: Seed for board generation and move selection.
//!
//! Logging goes to stderr and honours `RUST_LOG`.

use crate::command_line::cli::{Cli, Commands, play_once, simulate};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod command_line;

/// Global allocator using `tikv-jemallocator` for memory usage tracking.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Installs the tracing subscriber. `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main entry point.
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            board,
            print_board,
            common,
        } => {
            init_logging(common.debug);
            play_once(board, print_board, &common)
        }
        Commands::Simulate {
            games,
            board,
            common,
        } => {
            init_logging(common.debug);
            simulate(games, board, &common)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
