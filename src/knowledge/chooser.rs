//! Selection policies used by the agent to pick among equally good candidates.
//!
//! The agent never draws randomness itself. It hands the number of candidates
//! to a `Chooser`, which returns the index to act on. This keeps the move
//! policy reproducible: seed the random chooser, or use `FirstChooser` in
//! tests where any choice is acceptable.

use clap::ValueEnum;
use std::fmt::{Debug, Display};

/// Picks one index out of `len` candidates.
pub trait Chooser: Debug {
    /// Returns an index in `0..len`, or `None` if `len == 0`.
    fn choose(&mut self, len: usize) -> Option<usize>;
}

/// Uniformly random choice, backed by a seedable `fastrand::Rng`.
#[derive(Debug, Clone)]
pub struct RandomChooser(fastrand::Rng);

impl RandomChooser {
    /// A chooser seeded from the global generator.
    #[must_use]
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }

    /// A reproducible chooser.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl Default for RandomChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl Chooser for RandomChooser {
    fn choose(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0.usize(..len))
    }
}

/// Always takes the first candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstChooser;

impl Chooser for FirstChooser {
    fn choose(&mut self, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }
}

/// Runtime-selected chooser.
#[derive(Debug, Clone)]
pub enum ChooserImpls {
    /// See [`RandomChooser`].
    Random(RandomChooser),
    /// See [`FirstChooser`].
    First(FirstChooser),
}

impl Chooser for ChooserImpls {
    fn choose(&mut self, len: usize) -> Option<usize> {
        match self {
            Self::Random(c) => c.choose(len),
            Self::First(c) => c.choose(len),
        }
    }
}

/// The selection policies available from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum ChooserType {
    /// Uniformly random among the candidates
    #[default]
    Random,
    /// The first candidate found
    First,
}

impl Display for ChooserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::First => write!(f, "first"),
        }
    }
}

impl ChooserType {
    /// Builds the chooser, seeding the random policy when a seed is given.
    #[must_use]
    pub fn to_impl(self, seed: Option<u64>) -> ChooserImpls {
        match self {
            Self::Random => ChooserImpls::Random(
                seed.map_or_else(RandomChooser::new, RandomChooser::with_seed),
            ),
            Self::First => ChooserImpls::First(FirstChooser),
        }
    }
}
