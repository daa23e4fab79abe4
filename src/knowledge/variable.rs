//! The variable abstraction tracked by the knowledge base.

use std::fmt::Debug;
use std::hash::Hash;

/// An opaque boolean-valued identifier.
///
/// The engine relies only on equality and hashing. Any ordering a caller needs
/// (for deterministic output, say) is its own business.
///
/// Blanket-implemented for every `Clone + Eq + Hash + Debug` type, so grid
/// cells, integers, tuples and strings can all be used directly.
pub trait Variable: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Variable for T {}
