#![allow(clippy::cast_precision_loss)]

use clap::{Args, Parser, Subcommand};
use count_solver::knowledge::{Agent, ChooserType, PropagationStats};
use count_solver::minesweeper::{GameReport, Minesweeper, Outcome, play};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface for the count solver application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "count-solver",
    version,
    about = "Plays Minesweeper with a set-count constraint propagation engine"
)]
pub(crate) struct Cli {
    /// Specifies the subcommand to execute (e.g. `play`, `simulate`).
    #[clap(subcommand)]
    pub command: Commands,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Play a single game on a randomly generated board.
    Play {
        /// Board dimensions and mine count.
        #[command(flatten)]
        board: BoardOptions,

        /// Print the board with its mines once the game is over.
        #[arg(short, long, default_value_t = false)]
        print_board: bool,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Play many games and report how often the agent wins.
    Simulate {
        /// Number of games to play. Game `i` uses seed `seed + i`.
        #[arg(short, long, default_value_t = 100)]
        games: u64,

        /// Board dimensions and mine count.
        #[command(flatten)]
        board: BoardOptions,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Board shape. Defaults to the classic 8x8 board with 8 mines.
#[derive(Args, Debug, Clone, Copy)]
pub(crate) struct BoardOptions {
    /// Number of rows.
    #[arg(long, default_value_t = 8)]
    pub(crate) height: usize,

    /// Number of columns.
    #[arg(long, default_value_t = 8)]
    pub(crate) width: usize,

    /// Number of mines.
    #[arg(long, default_value_t = 8)]
    pub(crate) mines: usize,
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Enable debug output, logging every move and propagation pass.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Skip printing statistics once finished.
    #[arg(long, default_value_t = false)]
    pub(crate) no_stats: bool,

    /// How the agent picks among equally good moves.
    #[arg(long, value_enum, default_value_t = ChooserType::Random)]
    pub(crate) chooser: ChooserType,

    /// Seed for board generation and move selection. Random if omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

/// Builds the board for one game and plays it.
fn run_game(
    board_options: BoardOptions,
    common: &CommonOptions,
    seed: Option<u64>,
) -> Result<(Minesweeper, GameReport, PropagationStats), String> {
    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let board = Minesweeper::new(
        board_options.height,
        board_options.width,
        board_options.mines,
        &mut rng,
    )
    .map_err(|e| e.to_string())?;

    let mut agent = Agent::new(common.chooser.to_impl(seed));
    let report = play(&board, &mut agent).map_err(|e| e.to_string())?;
    Ok((board, report, agent.knowledge().stats()))
}

/// Plays one game and reports the result.
///
/// # Errors
///
/// If the board cannot be built or the engine reaches a contradiction.
pub(crate) fn play_once(
    board_options: BoardOptions,
    print_board: bool,
    common: &CommonOptions,
) -> Result<(), String> {
    let time = Instant::now();
    let (board, report, propagation) = run_game(board_options, common, common.seed)?;
    let elapsed = time.elapsed();

    if print_board {
        println!("{board}");
    }

    match report.outcome {
        Outcome::Won => println!("Won after {} moves", report.moves),
        Outcome::Lost(cell) => println!("Lost on {cell} after {} moves", report.moves),
    }

    if !common.no_stats {
        print_stats(
            elapsed,
            1,
            usize::from(report.won()),
            &[report],
            &propagation,
        );
    }
    Ok(())
}

/// Plays `games` games with consecutive seeds and reports the win rate.
///
/// # Errors
///
/// If a board cannot be built or the engine reaches a contradiction.
pub(crate) fn simulate(
    games: u64,
    board_options: BoardOptions,
    common: &CommonOptions,
) -> Result<(), String> {
    let base = common.seed.unwrap_or_else(|| fastrand::u64(..));
    let time = Instant::now();

    let mut reports = Vec::new();
    let mut propagation = PropagationStats::default();
    for i in 0..games {
        let (_, report, stats) = run_game(board_options, common, Some(base.wrapping_add(i)))?;
        propagation.passes += stats.passes;
        propagation.facts += stats.facts;
        propagation.constraints_added += stats.constraints_added;
        propagation.constraints_derived += stats.constraints_derived;
        propagation.redundant += stats.redundant;
        reports.push(report);
    }
    let elapsed = time.elapsed();

    let wins = reports.iter().filter(|r| r.won()).count();
    println!(
        "Won {wins} of {games} games ({:.1}%)",
        if games == 0 {
            0.0
        } else {
            wins as f64 * 100.0 / games as f64
        }
    );

    if !common.no_stats {
        print_stats(elapsed, reports.len(), wins, &reports, &propagation);
    }
    Ok(())
}

/// Reads allocated and resident memory from jemalloc, in MiB.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Helper function to print a single statistic line in a formatted table row.
fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of game and propagation statistics.
fn print_stats(
    elapsed: Duration,
    games: usize,
    wins: usize,
    reports: &[GameReport],
    propagation: &PropagationStats,
) {
    let elapsed_secs = elapsed.as_secs_f64();
    let moves: usize = reports.iter().map(|r| r.moves).sum();
    let informed: usize = reports.iter().map(|r| r.informed_moves).sum();
    let blind: usize = reports.iter().map(|r| r.blind_moves).sum();
    let flagged: usize = reports.iter().map(|r| r.flagged.len()).sum();

    println!("\n========================[ Game Statistics ]==========================");
    stat_line("Games", games);
    stat_line("Wins", wins);
    stat_line("Moves", moves);
    stat_line("Informed moves", informed);
    stat_line("Blind moves", blind);
    stat_line("Mines flagged", flagged);

    println!("=====================[ Propagation Statistics ]======================");
    stat_line_with_rate("Passes", propagation.passes, elapsed_secs);
    stat_line_with_rate("Facts", propagation.facts, elapsed_secs);
    stat_line_with_rate("Constraints", propagation.constraints_added, elapsed_secs);
    stat_line_with_rate("Derived", propagation.constraints_derived, elapsed_secs);
    stat_line("Redundant constraints", propagation.redundant);
    if let Some((allocated, resident)) = memory_usage() {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_play_defaults() {
        let cli = Cli::try_parse_from(["count-solver", "play"]).unwrap();
        let Commands::Play { board, common, .. } = cli.command else {
            panic!("expected play");
        };
        assert_eq!((board.height, board.width, board.mines), (8, 8, 8));
        assert_eq!(common.chooser, ChooserType::Random);
        assert_eq!(common.seed, None);
    }

    #[test]
    fn test_simulate_options() {
        let cli = Cli::try_parse_from([
            "count-solver",
            "simulate",
            "--games",
            "5",
            "--height",
            "16",
            "--width",
            "16",
            "--mines",
            "40",
            "--chooser",
            "first",
            "--seed",
            "9",
        ])
        .unwrap();
        let Commands::Simulate {
            games,
            board,
            common,
        } = cli.command
        else {
            panic!("expected simulate");
        };
        assert_eq!(games, 5);
        assert_eq!((board.height, board.width, board.mines), (16, 16, 40));
        assert_eq!(common.chooser, ChooserType::First);
        assert_eq!(common.seed, Some(9));
    }

    #[test]
    fn test_run_game_is_reproducible() {
        let common = CommonOptions {
            seed: Some(5),
            ..CommonOptions::default()
        };
        let board = BoardOptions {
            height: 6,
            width: 6,
            mines: 5,
        };
        let (board_a, report_a, _) = run_game(board, &common, common.seed).unwrap();
        let (board_b, report_b, _) = run_game(board, &common, common.seed).unwrap();
        assert_eq!(board_a, board_b);
        assert_eq!(report_a.outcome, report_b.outcome);
        assert_eq!(report_a.moves, report_b.moves);
    }

    #[test]
    fn test_run_game_rejects_bad_board() {
        let common = CommonOptions::default();
        let board = BoardOptions {
            height: 2,
            width: 2,
            mines: 9,
        };
        let err = run_game(board, &common, Some(1)).unwrap_err();
        assert_eq!(err, "cannot place 9 mines on 4 cells");
    }
}
