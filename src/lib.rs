#![warn(missing_docs)]
//! This crate provides a set-count constraint propagation engine and a Minesweeper
//! playing agent built on top of it.

/// The `knowledge` module implements the constraint knowledge base: set-count
/// constraints, their propagation to a fixed point, and the agent that feeds
/// observations in and chooses moves.
pub mod knowledge;

/// The `minesweeper` module implements the board the agent plays against and the
/// game loop that connects the two.
pub mod minesweeper;
