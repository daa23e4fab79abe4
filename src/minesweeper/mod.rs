//! A Minesweeper board and a driver that plays it with a knowledge-based agent.

pub mod board;
pub mod game;

pub use board::{BoardError, Cell, Minesweeper, Neighbours};
pub use game::{GameReport, Outcome, play};
