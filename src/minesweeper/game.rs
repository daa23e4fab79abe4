//! Plays a full game of Minesweeper with an [`Agent`].

use crate::knowledge::{Agent, Chooser, KnowledgeError, MoveKind};
use crate::minesweeper::board::{Cell, Minesweeper};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every mine was identified or every safe cell revealed.
    Won,
    /// The agent revealed a mine.
    Lost(Cell),
}

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    /// How the game ended.
    pub outcome: Outcome,
    /// Total cells revealed, including a fatal one.
    pub moves: usize,
    /// Moves made on cells proven safe.
    pub informed_moves: usize,
    /// Moves made without proof of safety.
    pub blind_moves: usize,
    /// Cells the agent had proven to be mines when the game ended.
    pub flagged: FxHashSet<Cell>,
}

impl GameReport {
    /// `true` if the game was won.
    #[must_use]
    pub const fn won(&self) -> bool {
        matches!(self.outcome, Outcome::Won)
    }
}

/// Plays `board` to the end with `agent`.
///
/// Each turn the agent's proven-safe moves are preferred over blind ones.
/// Revealing a mine loses. The game is won once the agent has identified
/// every mine or revealed every safe cell.
///
/// # Errors
///
/// Propagates knowledge errors, which can only arise if the board reports
/// inconsistent counts.
pub fn play<C: Chooser>(
    board: &Minesweeper,
    agent: &mut Agent<Cell, C>,
) -> Result<GameReport, KnowledgeError<Cell>> {
    let safe_cells = board.height() * board.width() - board.mine_count();
    let mut informed_moves = 0;
    let mut blind_moves = 0;

    let outcome = loop {
        let all_flagged = board.mine_count() > 0 && board.won(agent.known_true());
        if all_flagged || agent.visited().len() == safe_cells {
            break Outcome::Won;
        }

        let Some((cell, kind)) = agent.next_move(board.cells()) else {
            // only proven mines remain, so every safe cell has been visited
            break Outcome::Won;
        };
        match kind {
            MoveKind::Informed => informed_moves += 1,
            MoveKind::Blind => blind_moves += 1,
        }
        debug!(%cell, ?kind, "move");

        if board.is_mine(cell) {
            break Outcome::Lost(cell);
        }

        let deductions = agent.observe(cell, board.neighbours(cell), board.nearby_mines(cell))?;
        debug!(
            safe = deductions.known_false.len(),
            mines = deductions.known_true.len(),
            "deduced"
        );
    };

    let report = GameReport {
        outcome,
        moves: informed_moves + blind_moves,
        informed_moves,
        blind_moves,
        flagged: agent.known_true().clone(),
    };
    info!(
        ?outcome,
        moves = report.moves,
        blind = report.blind_moves,
        flagged = report.flagged.len(),
        "game over"
    );
    Ok(report)
}
