use crate::knowledge::error::{Contradiction, KnowledgeError};
use crate::knowledge::variable::Variable;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

/// A statement of the form "exactly `count` of `variables` are true".
///
/// Equality is structural: two constraints are equal when they cover the same
/// set of variables with the same count, regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint<V: Variable> {
    variables: FxHashSet<V>,
    count: usize,
}

impl<V: Variable> Constraint<V> {
    /// Builds a constraint, collapsing duplicate variables.
    ///
    /// # Errors
    ///
    /// `InvalidConstraint` if `count` exceeds the number of distinct variables.
    pub fn new<I: IntoIterator<Item = V>>(
        variables: I,
        count: usize,
    ) -> Result<Self, KnowledgeError<V>> {
        let variables: FxHashSet<V> = variables.into_iter().collect();
        if count > variables.len() {
            return Err(KnowledgeError::InvalidConstraint {
                count,
                size: variables.len(),
            });
        }
        Ok(Self { variables, count })
    }

    /// Builds a constraint whose count was obtained by arithmetic on other
    /// constraints, so an out-of-range count means the knowledge is inconsistent.
    pub(crate) fn derived(
        variables: FxHashSet<V>,
        count: isize,
    ) -> Result<Self, KnowledgeError<V>> {
        match usize::try_from(count) {
            Ok(count) if count <= variables.len() => Ok(Self { variables, count }),
            _ => Err(Contradiction::CountOutOfRange {
                count,
                size: variables.len(),
            }
            .into()),
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// `true` if no variables remain.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// How many of the variables are true.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Membership test.
    pub fn contains(&self, variable: &V) -> bool {
        self.variables.contains(variable)
    }

    /// Iterates the variables in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.variables.iter()
    }

    /// The underlying variable set.
    pub const fn variables(&self) -> &FxHashSet<V> {
        &self.variables
    }

    /// Every variable is false.
    pub fn is_all_false(&self) -> bool {
        self.count == 0 && !self.is_empty()
    }

    /// Every variable is true.
    pub fn is_all_true(&self) -> bool {
        self.count > 0 && self.count == self.len()
    }

    /// The facts this constraint forces on its own, if it is degenerate.
    pub fn implied_facts(&self) -> Option<bool> {
        if self.is_all_false() {
            Some(false)
        } else if self.is_all_true() {
            Some(true)
        } else {
            None
        }
    }

    /// Returns a copy with `variable` removed, decrementing the count if the
    /// variable is known to be true.
    ///
    /// # Errors
    ///
    /// `InvalidState` if `variable` is not a member. `Contradiction` if the
    /// removal leaves a count that no assignment of the remaining variables
    /// can satisfy.
    pub fn without(&self, variable: &V, was_true: bool) -> Result<Self, KnowledgeError<V>> {
        if !self.contains(variable) {
            return Err(KnowledgeError::InvalidState(variable.clone()));
        }

        let mut variables = self.variables.clone();
        variables.remove(variable);
        #[allow(clippy::cast_possible_wrap)]
        let count = self.count as isize - isize::from(was_true);
        Self::derived(variables, count)
    }

    /// `true` if every variable here also appears in `other`, and `other` has more.
    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        self.len() < other.len() && self.variables.is_subset(&other.variables)
    }

    /// Subset resolution: given `self ⊂ superset`, the variables only in
    /// `superset` must hold exactly the true variables `self` does not account for.
    ///
    /// # Errors
    ///
    /// `Contradiction` if the counts cannot both hold.
    pub fn difference(&self, superset: &Self) -> Result<Self, KnowledgeError<V>> {
        let variables = superset
            .variables
            .difference(&self.variables)
            .cloned()
            .collect();
        #[allow(clippy::cast_possible_wrap)]
        let count = superset.count as isize - self.count as isize;
        Self::derived(variables, count)
    }

    /// Same variables, regardless of count.
    pub fn same_variables(&self, other: &Self) -> bool {
        self.variables == other.variables
    }
}

impl<V: Variable> Display for Constraint<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = self.variables.iter().map(|v| format!("{v:?}")).collect_vec();
        names.sort_unstable();
        write!(f, "{{{}}} = {}", names.join(", "), self.count)
    }
}
