//! The knowledge base: live constraints plus the variables they have resolved.
//!
//! Facts enter through [`KnowledgeBase::add`] (a new constraint) or
//! [`KnowledgeBase::record`] (a directly observed variable). Both simplify the
//! live constraints against everything already known and then run the
//! propagation loop to a fixed point:
//!
//! 1. every degenerate constraint (`count == 0` or `count == len`) classifies
//!    all of its variables; classifying a variable shrinks every constraint
//!    that mentions it, which may make further constraints degenerate, so the
//!    implied facts are drained from a queue rather than handled recursively;
//! 2. every ordered pair of constraints `A ⊂ B` yields `B \ A` with count
//!    `b - a`. Derived constraints are buffered and merged after the pass.
//!
//! The loop stops after a pass that classifies nothing and adds nothing. Each
//! pass either shrinks the pool of unclassified variables or adds one of
//! finitely many `(subset, count)` pairs not yet present, so it terminates.
//!
//! Every public mutating call is transactional: on error the knowledge base is
//! left exactly as it was before the call.

use crate::knowledge::constraint::Constraint;
use crate::knowledge::error::{Contradiction, KnowledgeError};
use crate::knowledge::variable::Variable;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Variables newly classified by a single call, in the order they were classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deductions<V: Variable> {
    /// Variables proven true.
    pub known_true: Vec<V>,
    /// Variables proven false.
    pub known_false: Vec<V>,
}

impl<V: Variable> Default for Deductions<V> {
    fn default() -> Self {
        Self {
            known_true: Vec::new(),
            known_false: Vec::new(),
        }
    }
}

impl<V: Variable> Deductions<V> {
    /// `true` if nothing was classified.
    pub fn is_empty(&self) -> bool {
        self.known_true.is_empty() && self.known_false.is_empty()
    }

    /// Total number of classified variables.
    pub fn len(&self) -> usize {
        self.known_true.len() + self.known_false.len()
    }

    fn push(&mut self, variable: V, value: bool) {
        if value {
            self.known_true.push(variable);
        } else {
            self.known_false.push(variable);
        }
    }

    /// Appends the deductions of a later call.
    pub fn extend(&mut self, other: Self) {
        self.known_true.extend(other.known_true);
        self.known_false.extend(other.known_false);
    }
}

/// Counters describing the work done by the knowledge base over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PropagationStats {
    /// Fixed-point passes run.
    pub passes: usize,
    /// Variables classified.
    pub facts: usize,
    /// Constraints inserted, whether supplied or derived.
    pub constraints_added: usize,
    /// Constraints produced by subset resolution and inserted.
    pub constraints_derived: usize,
    /// Constraints discarded because an equal one was already live.
    pub redundant: usize,
}

/// A queue of facts waiting to be applied, drained by the propagation loop.
type FactQueue<V> = VecDeque<(V, bool)>;

/// A set-count constraint knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase<V: Variable> {
    constraints: Vec<Constraint<V>>,
    known_true: FxHashSet<V>,
    known_false: FxHashSet<V>,
    stats: PropagationStats,
}

impl<V: Variable> Default for KnowledgeBase<V> {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
            known_true: FxHashSet::default(),
            known_false: FxHashSet::default(),
            stats: PropagationStats::default(),
        }
    }
}

impl<V: Variable> KnowledgeBase<V> {
    /// Creates an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live constraints, in insertion order.
    pub fn constraints(&self) -> &[Constraint<V>] {
        &self.constraints
    }

    /// Variables proven true.
    pub const fn known_true(&self) -> &FxHashSet<V> {
        &self.known_true
    }

    /// Variables proven false.
    pub const fn known_false(&self) -> &FxHashSet<V> {
        &self.known_false
    }

    /// `Some(value)` if `variable` has been classified.
    pub fn value(&self, variable: &V) -> Option<bool> {
        if self.known_true.contains(variable) {
            Some(true)
        } else if self.known_false.contains(variable) {
            Some(false)
        } else {
            None
        }
    }

    /// Lifetime counters.
    pub const fn stats(&self) -> PropagationStats {
        self.stats
    }

    /// Adds the fact "exactly `count` of `variables` are true" and propagates
    /// to a fixed point.
    ///
    /// # Errors
    ///
    /// `InvalidConstraint` if `count` exceeds the number of distinct variables.
    /// `Contradiction` if the fact is inconsistent with what is already known.
    /// In both cases nothing changes.
    pub fn add<I: IntoIterator<Item = V>>(
        &mut self,
        variables: I,
        count: usize,
    ) -> Result<Deductions<V>, KnowledgeError<V>> {
        let constraint = Constraint::new(variables, count)?;
        self.add_constraint(constraint)
    }

    /// As [`add`](Self::add), for an already built constraint.
    ///
    /// # Errors
    ///
    /// `Contradiction` if the constraint is inconsistent with what is known.
    pub fn add_constraint(
        &mut self,
        constraint: Constraint<V>,
    ) -> Result<Deductions<V>, KnowledgeError<V>> {
        debug!(%constraint, "adding constraint");
        self.transaction(|kb, deductions| {
            let mut queue = FactQueue::new();
            if kb.insert(constraint, &mut queue)? {
                kb.drain(&mut queue, deductions)?;
            }
            kb.propagate(deductions)
        })
    }

    /// Records that `variable` is `value` and propagates to a fixed point.
    /// Recording a fact that is already known is a no-op.
    ///
    /// # Errors
    ///
    /// `Contradiction` if `variable` is already known to have the other value,
    /// or if the fact makes a live constraint unsatisfiable. Nothing changes.
    pub fn record(&mut self, variable: V, value: bool) -> Result<Deductions<V>, KnowledgeError<V>> {
        self.transaction(|kb, deductions| {
            let mut queue = FactQueue::new();
            queue.push_back((variable, value));
            kb.drain(&mut queue, deductions)?;
            kb.propagate(deductions)
        })
    }

    /// Runs `op` against a scratch copy and commits it only on success.
    fn transaction<F>(&mut self, op: F) -> Result<Deductions<V>, KnowledgeError<V>>
    where
        F: FnOnce(&mut Self, &mut Deductions<V>) -> Result<(), KnowledgeError<V>>,
    {
        let mut scratch = self.clone();
        let mut deductions = Deductions::default();
        match op(&mut scratch, &mut deductions) {
            Ok(()) => {
                *self = scratch;
                Ok(deductions)
            }
            Err(err) => {
                warn!(error = %err, "rejecting update, knowledge left unchanged");
                Err(err)
            }
        }
    }

    /// Simplifies `constraint` against the known variables and stores it
    /// unless it is empty or already present. Facts it implies are queued.
    ///
    /// Returns `true` if the constraint was stored.
    fn insert(
        &mut self,
        constraint: Constraint<V>,
        queue: &mut FactQueue<V>,
    ) -> Result<bool, KnowledgeError<V>> {
        let constraint = self.simplify(constraint)?;

        if constraint.is_empty() {
            return match constraint.count() {
                0 => Ok(false),
                count => Err(Contradiction::EmptyWithCount(count).into()),
            };
        }

        if let Some(existing) = self
            .constraints
            .iter()
            .find(|c| c.same_variables(&constraint))
        {
            if existing.count() != constraint.count() {
                return Err(Contradiction::ConflictingCounts {
                    first: existing.count(),
                    second: constraint.count(),
                }
                .into());
            }
            trace!(%constraint, "redundant constraint");
            self.stats.redundant += 1;
            return Ok(false);
        }

        if let Some(value) = constraint.implied_facts() {
            queue.extend(constraint.iter().map(|v| (v.clone(), value)));
        }
        self.constraints.push(constraint);
        self.stats.constraints_added += 1;
        Ok(true)
    }

    /// Removes every classified variable from `constraint`.
    fn simplify(&self, constraint: Constraint<V>) -> Result<Constraint<V>, KnowledgeError<V>> {
        let classified = constraint
            .iter()
            .filter_map(|v| self.value(v).map(|value| (v.clone(), value)))
            .collect_vec();

        classified
            .into_iter()
            .try_fold(constraint, |c, (v, value)| c.without(&v, value))
    }

    /// Applies queued facts until the queue is empty.
    fn drain(
        &mut self,
        queue: &mut FactQueue<V>,
        deductions: &mut Deductions<V>,
    ) -> Result<bool, KnowledgeError<V>> {
        let mut changed = false;
        while let Some((variable, value)) = queue.pop_front() {
            if self.assign(variable, value, queue, deductions)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Classifies one variable and shrinks every constraint mentioning it.
    /// Constraints left degenerate queue their facts instead of recursing.
    ///
    /// Returns `false` if the variable already had this value.
    fn assign(
        &mut self,
        variable: V,
        value: bool,
        queue: &mut FactQueue<V>,
        deductions: &mut Deductions<V>,
    ) -> Result<bool, KnowledgeError<V>> {
        match self.value(&variable) {
            Some(known) if known == value => return Ok(false),
            Some(_) => return Err(Contradiction::Conflict(variable).into()),
            None => {}
        }

        trace!(?variable, value, "classified");
        if value {
            self.known_true.insert(variable.clone());
        } else {
            self.known_false.insert(variable.clone());
        }
        self.stats.facts += 1;

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for constraint in std::mem::take(&mut self.constraints) {
            if !constraint.contains(&variable) {
                constraints.push(constraint);
                continue;
            }

            let shrunk = constraint.without(&variable, value)?;
            if shrunk.is_empty() {
                if shrunk.count() != 0 {
                    return Err(Contradiction::EmptyWithCount(shrunk.count()).into());
                }
                continue;
            }
            if let Some(implied) = shrunk.implied_facts() {
                queue.extend(shrunk.iter().map(|v| (v.clone(), implied)));
            }
            constraints.push(shrunk);
        }
        self.constraints = Self::dedup(constraints)?;

        deductions.push(variable, value);
        Ok(true)
    }

    /// Shrinking can make two constraints collapse onto the same variables.
    fn dedup(constraints: Vec<Constraint<V>>) -> Result<Vec<Constraint<V>>, KnowledgeError<V>> {
        let mut kept: Vec<Constraint<V>> = Vec::with_capacity(constraints.len());
        for constraint in constraints {
            match kept.iter().find(|c| c.same_variables(&constraint)) {
                Some(existing) if existing.count() != constraint.count() => {
                    return Err(Contradiction::ConflictingCounts {
                        first: existing.count(),
                        second: constraint.count(),
                    }
                    .into());
                }
                Some(_) => {}
                None => kept.push(constraint),
            }
        }
        Ok(kept)
    }

    /// Runs fact propagation and subset resolution until neither changes anything.
    fn propagate(&mut self, deductions: &mut Deductions<V>) -> Result<(), KnowledgeError<V>> {
        loop {
            self.stats.passes += 1;
            let mut queue: FactQueue<V> = self
                .constraints
                .iter()
                .filter_map(|c| c.implied_facts().map(|value| (c, value)))
                .flat_map(|(c, value)| c.iter().map(move |v| (v.clone(), value)))
                .collect();
            let mut changed = self.drain(&mut queue, deductions)?;

            for derived in self.resolve_subsets()? {
                trace!(constraint = %derived, "derived by subset resolution");
                if self.insert(derived, &mut queue)? {
                    self.stats.constraints_derived += 1;
                    changed = true;
                }
            }
            if self.drain(&mut queue, deductions)? {
                changed = true;
            }

            debug!(
                pass = self.stats.passes,
                constraints = self.constraints.len(),
                known_true = self.known_true.len(),
                known_false = self.known_false.len(),
                changed,
                "propagation pass"
            );

            if !changed {
                return Ok(());
            }
        }
    }

    /// Derives `B \ A` for every ordered pair of live constraints with `A ⊂ B`.
    /// The results are collected into a side buffer and not yet stored.
    fn resolve_subsets(&self) -> Result<Vec<Constraint<V>>, KnowledgeError<V>> {
        let mut derived: Vec<Constraint<V>> = Vec::new();
        for (subset, superset) in self.constraints.iter().tuple_combinations() {
            for (a, b) in [(subset, superset), (superset, subset)] {
                if !a.is_strict_subset_of(b) {
                    continue;
                }
                let candidate = a.difference(b)?;
                if candidate.is_empty()
                    || candidate == *a
                    || candidate == *b
                    || self.constraints.contains(&candidate)
                    || derived.contains(&candidate)
                {
                    continue;
                }
                derived.push(candidate);
            }
        }
        Ok(derived)
    }

    /// Checks the structural invariants: classified sets are disjoint and no
    /// live constraint is empty or mentions a classified variable.
    pub fn is_consistent(&self) -> bool {
        self.known_true.is_disjoint(&self.known_false)
            && self.constraints.iter().all(|c| {
                !c.is_empty()
                    && c.count() <= c.len()
                    && c.iter().all(|v| self.value(v).is_none())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(vars: &[char]) -> FxHashSet<char> {
        vars.iter().copied().collect()
    }

    #[test]
    fn test_all_false_constraint() {
        let mut kb = KnowledgeBase::new();
        let deductions = kb.add(['a', 'b', 'c'], 0).unwrap();
        assert_eq!(kb.known_false(), &set(&['a', 'b', 'c']));
        assert!(kb.known_true().is_empty());
        assert_eq!(deductions.known_false.len(), 3);
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_all_true_constraint() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b'], 2).unwrap();
        assert_eq!(kb.known_true(), &set(&['a', 'b']));
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_subset_resolution_forces_true() {
        let mut kb = KnowledgeBase::new();
        kb.add(['x', 'y'], 1).unwrap();
        let deductions = kb.add(['x', 'y', 'z'], 2).unwrap();
        assert_eq!(deductions.known_true, vec!['z']);
        assert!(kb.known_true().contains(&'z'));
        assert!(kb.value(&'x').is_none());
    }

    #[test]
    fn test_subset_resolution_forces_false() {
        let mut kb = KnowledgeBase::new();
        kb.add(['p', 'q'], 1).unwrap();
        kb.add(['p', 'q', 'r'], 1).unwrap();
        assert_eq!(kb.value(&'r'), Some(false));
    }

    #[test]
    fn test_simplification_before_storage() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b', 'c'], 0).unwrap();
        kb.add(['a', 'b', 'c', 'd'], 1).unwrap();
        assert_eq!(kb.known_false(), &set(&['a', 'b', 'c']));
        assert_eq!(kb.known_true(), &set(&['d']));
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_known_true_members_decrement_count() {
        let mut kb = KnowledgeBase::new();
        kb.record('a', true).unwrap();
        kb.add(['a', 'b', 'c'], 2).unwrap();
        assert_eq!(
            kb.constraints(),
            &[Constraint::new(['b', 'c'], 1).unwrap()]
        );
    }

    #[test]
    fn test_duplicate_constraint_stored_once() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b'], 1).unwrap();
        kb.add(['b', 'a'], 1).unwrap();
        assert_eq!(kb.constraints().len(), 1);
        assert_eq!(kb.stats().redundant, 1);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b', 'c'], 1).unwrap();
        kb.record('a', false).unwrap();
        let before = kb.clone();
        let deductions = kb.record('a', false).unwrap();
        assert!(deductions.is_empty());
        assert_eq!(kb.known_false(), before.known_false());
        assert_eq!(kb.constraints(), before.constraints());
    }

    #[test]
    fn test_conflicting_record() {
        let mut kb = KnowledgeBase::new();
        kb.record('x', true).unwrap();
        let err = kb.record('x', false).unwrap_err();
        assert_eq!(err, KnowledgeError::Contradiction(Contradiction::Conflict('x')));
        assert_eq!(kb.known_true(), &set(&['x']));
        assert!(kb.known_false().is_empty());
    }

    #[test]
    fn test_empty_constraint_with_count() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a'], 0).unwrap();
        let err = kb.add(['a'], 1).unwrap_err();
        assert!(err.is_contradiction());
    }

    #[test]
    fn test_empty_constraint_is_dropped() {
        let mut kb: KnowledgeBase<char> = KnowledgeBase::new();
        let deductions = kb.add([], 0).unwrap();
        assert!(deductions.is_empty());
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_invalid_constraint_rejected() {
        let mut kb = KnowledgeBase::new();
        let err = kb.add(['a', 'b'], 3).unwrap_err();
        assert_eq!(err, KnowledgeError::InvalidConstraint { count: 3, size: 2 });
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_conflicting_counts() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b'], 1).unwrap();
        let err = kb.add(['a', 'b'], 0).unwrap_err();
        assert!(err.is_contradiction());
        assert_eq!(kb.constraints().len(), 1);
        assert!(kb.known_false().is_empty());
    }

    #[test]
    fn test_failed_add_leaves_state_untouched() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b', 'c'], 1).unwrap();
        kb.add(['c', 'd'], 1).unwrap();
        let before = kb.clone();

        // same variables as the first constraint, different count
        let err = kb.add(['a', 'b', 'c'], 0).unwrap_err();
        assert!(err.is_contradiction());
        assert_eq!(kb.constraints(), before.constraints());
        assert_eq!(kb.known_true(), before.known_true());
        assert_eq!(kb.known_false(), before.known_false());
        assert_eq!(kb.stats(), before.stats());
    }

    #[test]
    fn test_record_propagates_chain() {
        let mut kb = KnowledgeBase::new();
        kb.add([1, 2], 1).unwrap();
        kb.add([2, 3], 1).unwrap();
        kb.add([3, 4], 1).unwrap();
        let deductions = kb.record(1, true).unwrap();
        assert_eq!(deductions.known_true, vec![1, 3]);
        assert_eq!(deductions.known_false, vec![2, 4]);
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_monotonic_growth() {
        let mut kb = KnowledgeBase::new();
        let steps: [(&[u8], usize); 4] = [(&[1, 2, 3], 1), (&[3, 4], 1), (&[1, 2], 0), (&[4, 5], 1)];
        let mut sizes = (0, 0);
        for (vars, count) in steps {
            kb.add(vars.iter().copied(), count).unwrap();
            let now = (kb.known_true().len(), kb.known_false().len());
            assert!(now.0 >= sizes.0 && now.1 >= sizes.1);
            assert!(kb.is_consistent());
            sizes = now;
        }
        assert_eq!(kb.value(&3), Some(true));
        assert_eq!(kb.value(&4), Some(false));
        assert_eq!(kb.value(&5), Some(true));
    }

    #[test]
    fn test_stats_track_derivations() {
        let mut kb = KnowledgeBase::new();
        kb.add(['a', 'b'], 1).unwrap();
        kb.add(['a', 'b', 'c', 'd'], 1).unwrap();
        let stats = kb.stats();
        assert_eq!(stats.constraints_derived, 1);
        assert_eq!(stats.facts, 2);
        assert!(stats.passes >= 2);
    }
}
