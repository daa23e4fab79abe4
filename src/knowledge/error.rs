//! Error types raised by the knowledge base.
//!
//! Two failure classes exist. `InvalidConstraint` and `InvalidState` indicate a
//! malformed request and are rejected before any state changes. A
//! `Contradiction` means the accumulated facts are logically inconsistent,
//! which is fatal to the session that produced them.

use std::fmt::Debug;
use thiserror::Error;

/// The ways in which accumulated knowledge can become inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Contradiction<V: Debug> {
    /// A variable was forced to be both true and false.
    #[error("variable {0:?} is forced both true and false")]
    Conflict(V),

    /// A constraint lost all of its variables but still requires some to be true.
    #[error("empty constraint still requires {0} true variables")]
    EmptyWithCount(usize),

    /// Simplification or resolution produced a count outside `0..=size`.
    #[error("derived count {count} is impossible over {size} variables")]
    CountOutOfRange {
        /// The count the derivation asked for, negative when more true
        /// variables were removed than the constraint allowed.
        count: isize,
        /// The number of variables left in the constraint.
        size: usize,
    },

    /// Two live constraints cover the same variables with different counts.
    #[error("the same variables are constrained to both {first} and {second}")]
    ConflictingCounts {
        /// The count already known.
        first: usize,
        /// The count that disagrees with it.
        second: usize,
    },
}

/// Errors returned by [`Constraint`](crate::knowledge::constraint::Constraint),
/// [`KnowledgeBase`](crate::knowledge::knowledge_base::KnowledgeBase) and
/// [`Agent`](crate::knowledge::agent::Agent) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeError<V: Debug> {
    /// The count is larger than the number of variables it ranges over.
    #[error("invalid constraint: count {count} exceeds {size} variables")]
    InvalidConstraint {
        /// Requested count.
        count: usize,
        /// Number of distinct variables supplied.
        size: usize,
    },

    /// A variable was removed from a constraint that does not contain it.
    #[error("variable {0:?} is not part of the constraint")]
    InvalidState(V),

    /// The knowledge is inconsistent.
    #[error("contradiction: {0}")]
    Contradiction(Contradiction<V>),
}

impl<V: Debug> From<Contradiction<V>> for KnowledgeError<V> {
    fn from(contradiction: Contradiction<V>) -> Self {
        Self::Contradiction(contradiction)
    }
}

impl<V: Debug> KnowledgeError<V> {
    /// Returns `true` if this error signals inconsistent knowledge.
    pub const fn is_contradiction(&self) -> bool {
        matches!(self, Self::Contradiction(_))
    }
}
