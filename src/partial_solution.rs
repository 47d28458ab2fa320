// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The partial solution is the solver's memory of what has been assigned.

use std::fmt::{self, Display};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::constraint::{Constraint, SetRelation};
use crate::incompatibility::Incompatibility;
use crate::package::Package;
use crate::term::Term;
use crate::type_aliases::Set;
use crate::version::Version;

/// What put an assignment into the partial solution.
#[derive(Debug, Clone)]
pub enum AssignmentCause<V: Version> {
    /// A free choice of a concrete version by the solver.
    Decision,
    /// A term forced by unit propagation of an incompatibility.
    Derivation(Rc<Incompatibility<V>>),
}

/// One entry of the assignment log.
#[derive(Debug, Clone)]
pub struct Assignment<V: Version> {
    term: Term<V>,
    cause: AssignmentCause<V>,
    decision_level: u32,
    index: usize,
}

impl<V: Version> Assignment<V> {
    /// The assigned term.
    pub fn term(&self) -> &Term<V> {
        &self.term
    }

    /// What caused the assignment.
    pub fn cause(&self) -> &AssignmentCause<V> {
        &self.cause
    }

    /// Number of decisions taken when this assignment was made, including
    /// this one if it is a decision.
    pub fn decision_level(&self) -> u32 {
        self.decision_level
    }

    /// Position in the chronological assignment log.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Is this assignment a decision?
    pub fn is_decision(&self) -> bool {
        matches!(self.cause, AssignmentCause::Decision)
    }
}

impl<V: Version> Display for Assignment<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.cause {
            AssignmentCause::Decision => write!(f, "decision: {}", self.term),
            AssignmentCause::Derivation(_) => write!(f, "derivation: {}", self.term),
        }
    }
}

/// The chronological assignment log, with per-package indexes.
///
/// The log itself is the source of truth. The `decisions` and `terms` maps
/// are derived views in insertion order, rebuilt from the log on
/// backtracking, which keeps iteration deterministic for a given input.
#[derive(Debug, Clone)]
pub struct PartialSolution<V: Version> {
    assignments: Vec<Assignment<V>>,
    decisions: IndexMap<Package, V>,
    terms: IndexMap<Package, Term<V>>,
    required: Set<Package>,
}

impl<V: Version> PartialSolution<V> {
    /// Empty partial solution, no assignments.
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            decisions: IndexMap::new(),
            terms: IndexMap::new(),
            required: Set::default(),
        }
    }

    /// The decided versions, in decision order.
    pub fn decisions(&self) -> &IndexMap<Package, V> {
        &self.decisions
    }

    /// Number of decisions taken so far.
    pub fn decision_level(&self) -> u32 {
        self.decisions.len() as u32
    }

    /// The chronological assignment log.
    pub fn assignments(&self) -> &[Assignment<V>] {
        &self.assignments
    }

    /// Record a decision for a package at the next decision level.
    pub fn decide(&mut self, package: Package, version: V) {
        self.decisions.insert(package.clone(), version.clone());
        let term = Term::new(Constraint::exact(package, version), true);
        let level = self.decision_level();
        self.push_assignment(term, AssignmentCause::Decision, level);
    }

    /// Record a term derived from an incompatibility at the current level.
    pub fn derive(&mut self, term: Term<V>, cause: Rc<Incompatibility<V>>) {
        let level = self.decision_level();
        self.push_assignment(term, AssignmentCause::Derivation(cause), level);
    }

    fn push_assignment(&mut self, term: Term<V>, cause: AssignmentCause<V>, decision_level: u32) {
        let assignment = Assignment {
            term: term.clone(),
            cause,
            decision_level,
            index: self.assignments.len(),
        };
        self.assignments.push(assignment);
        self.index_term(term);
    }

    fn index_term(&mut self, term: Term<V>) {
        let package = term.package().clone();
        if term.positive() {
            self.required.insert(package.clone());
        }
        match self.terms.entry(package) {
            indexmap::map::Entry::Occupied(mut entry) => {
                let combined = entry.get().intersect(&term);
                entry.insert(combined);
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(term);
            }
        }
    }

    /// How the accumulated knowledge about a term's package relates to the
    /// term. [SetRelation::Overlap] when nothing is known about the package.
    pub fn relation(&self, term: &Term<V>) -> SetRelation {
        match self.terms.get(term.package()) {
            Some(assigned) => assigned.relation(term),
            None => SetRelation::Overlap,
        }
    }

    /// Does the accumulated knowledge imply the term?
    pub fn satisfies(&self, term: &Term<V>) -> bool {
        self.relation(term) == SetRelation::Subset
    }

    /// The earliest assignment at which the accumulated terms for the
    /// package imply the given term.
    ///
    /// Panics if the partial solution does not satisfy the term, which
    /// would be a bug in conflict resolution.
    pub fn satisfier(&self, term: &Term<V>) -> &Assignment<V> {
        let mut assigned: Option<Term<V>> = None;
        for assignment in &self.assignments {
            if assignment.term().package() != term.package() {
                continue;
            }
            let accumulated = match &assigned {
                Some(prev) => prev.intersect(assignment.term()),
                None => assignment.term().clone(),
            };
            if accumulated.satisfies(term) {
                return assignment;
            }
            assigned = Some(accumulated);
        }
        panic!("{term} is not satisfied by the partial solution");
    }

    /// The positive running terms of packages that are required but not
    /// decided yet, in first-assignment order.
    pub fn unsatisfied(&self) -> Vec<&Term<V>> {
        self.terms
            .iter()
            .filter(|(package, _)| {
                self.required.contains(*package) && !self.decisions.contains_key(*package)
            })
            .map(|(_, term)| term)
            .collect()
    }

    /// Drop every assignment above the given decision level and rebuild
    /// the per-package indexes from the remaining log.
    pub fn backtrack(&mut self, decision_level: u32) {
        self.assignments
            .retain(|a| a.decision_level() <= decision_level);
        self.decisions.truncate(decision_level as usize);
        self.terms.clear();
        self.required.clear();
        let terms: Vec<Term<V>> = self
            .assignments
            .iter()
            .map(|a| a.term().clone())
            .collect();
        for term in terms {
            self.index_term(term);
        }
    }
}

// TESTS #######################################################################
