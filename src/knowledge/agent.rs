//! The decision layer on top of the knowledge base.
//!
//! An agent turns observations ("this variable turned out false, and `count`
//! of its neighbours are true") into constraints, and answers the question
//! "what should I act on next?". Known-false variables that have not been
//! visited are always preferred. Failing that, the agent falls back to a blind
//! choice among everything not proven true.

use crate::knowledge::chooser::{Chooser, RandomChooser};
use crate::knowledge::constraint::Constraint;
use crate::knowledge::error::{Contradiction, KnowledgeError};
use crate::knowledge::knowledge_base::{Deductions, KnowledgeBase};
use crate::knowledge::variable::Variable;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use tracing::debug;

/// How a move was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// The variable is proven false.
    Informed,
    /// Nothing was proven safe; the variable is merely not proven true.
    Blind,
}

/// A per-session agent owning its knowledge base.
#[derive(Debug, Clone)]
pub struct Agent<V: Variable, C: Chooser = RandomChooser> {
    knowledge: KnowledgeBase<V>,
    visited: FxHashSet<V>,
    chooser: C,
}

impl<V: Variable> Default for Agent<V, RandomChooser> {
    fn default() -> Self {
        Self::new(RandomChooser::new())
    }
}

impl<V: Variable, C: Chooser> Agent<V, C> {
    /// Creates an agent with an empty knowledge base.
    pub fn new(chooser: C) -> Self {
        Self {
            knowledge: KnowledgeBase::new(),
            visited: FxHashSet::default(),
            chooser,
        }
    }

    /// The underlying knowledge base.
    pub const fn knowledge(&self) -> &KnowledgeBase<V> {
        &self.knowledge
    }

    /// Variables already acted on.
    pub const fn visited(&self) -> &FxHashSet<V> {
        &self.visited
    }

    /// Variables proven true.
    pub const fn known_true(&self) -> &FxHashSet<V> {
        self.knowledge.known_true()
    }

    /// Variables proven false.
    pub const fn known_false(&self) -> &FxHashSet<V> {
        self.knowledge.known_false()
    }

    /// Feeds one observation: `variable` was acted on, is false, and exactly
    /// `count` members of `neighbourhood` are true.
    ///
    /// The neighbourhood constraint excludes visited and known-false members
    /// and discounts known-true ones before it reaches the knowledge base.
    ///
    /// # Errors
    ///
    /// `InvalidConstraint` if `count` exceeds the neighbourhood size, and
    /// `Contradiction` if the observation is inconsistent with earlier ones.
    /// On error the agent is unchanged.
    pub fn observe<I: IntoIterator<Item = V>>(
        &mut self,
        variable: V,
        neighbourhood: I,
        count: usize,
    ) -> Result<Deductions<V>, KnowledgeError<V>> {
        let neighbourhood: FxHashSet<V> = neighbourhood.into_iter().collect();
        if count > neighbourhood.len() {
            return Err(KnowledgeError::InvalidConstraint {
                count,
                size: neighbourhood.len(),
            });
        }

        let mut knowledge = self.knowledge.clone();
        let mut deductions = knowledge.record(variable.clone(), false)?;

        let mut unknown = FxHashSet::default();
        let mut true_neighbours = 0;
        for neighbour in neighbourhood {
            if neighbour == variable || self.visited.contains(&neighbour) {
                continue;
            }
            match knowledge.value(&neighbour) {
                Some(true) => true_neighbours += 1,
                Some(false) => {}
                None => {
                    unknown.insert(neighbour);
                }
            }
        }

        #[allow(clippy::cast_possible_wrap)]
        let remaining = count as isize - true_neighbours as isize;
        if remaining < 0 {
            return Err(Contradiction::CountOutOfRange {
                count: remaining,
                size: unknown.len(),
            }
            .into());
        }
        let constraint = Constraint::derived(unknown, remaining)?;
        debug!(?variable, %constraint, "observation");
        deductions.extend(knowledge.add_constraint(constraint)?);

        self.knowledge = knowledge;
        self.visited.insert(variable);
        Ok(deductions)
    }

    /// Some unvisited variable proven false, if there is one.
    pub fn choose_informed(&mut self) -> Option<V> {
        let candidates = self
            .knowledge
            .known_false()
            .iter()
            .filter(|v| !self.visited.contains(*v))
            .cloned()
            .collect_vec();
        self.pick(candidates)
    }

    /// Some variable of `universe` that is neither visited nor proven true.
    ///
    /// The engine never enumerates the universe itself; the caller supplies it.
    pub fn choose_blind<I: IntoIterator<Item = V>>(&mut self, universe: I) -> Option<V> {
        let candidates = universe
            .into_iter()
            .unique()
            .filter(|v| !self.visited.contains(v) && !self.knowledge.known_true().contains(v))
            .collect_vec();
        self.pick(candidates)
    }

    /// An informed move if one exists, otherwise a blind one.
    pub fn next_move<I: IntoIterator<Item = V>>(&mut self, universe: I) -> Option<(V, MoveKind)> {
        if let Some(v) = self.choose_informed() {
            return Some((v, MoveKind::Informed));
        }
        self.choose_blind(universe).map(|v| (v, MoveKind::Blind))
    }

    fn pick(&mut self, mut candidates: Vec<V>) -> Option<V> {
        let i = self.chooser.choose(candidates.len())?;
        (i < candidates.len()).then(|| candidates.swap_remove(i))
    }
}
