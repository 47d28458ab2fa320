// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PubGrub version solving algorithm.
//!
//! Version solving consists in finding a set of packages and versions that
//! satisfy all the constraints of a given project dependency graph. The
//! solver alternates two phases until every required package is decided:
//!
//! - **Unit propagation**: for every almost-satisfied incompatibility,
//!   derive the negation of its single unsatisfied term. A fully satisfied
//!   incompatibility is a conflict, resolved by deriving a new
//!   incompatibility from its causes and backjumping.
//! - **Decision making**: pick an undecided required package, fetch its
//!   dependencies once, and select its preferred compatible version.
//!
//! Conflict resolution records which incompatibilities produced each
//! derived one, building the derivation tree that
//! [FailureWriter](crate::report::FailureWriter) renders when solving
//! fails.

use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use log::{debug, info};

use crate::constraint::{Constraint, SetRelation};
use crate::error::SolveError;
use crate::incompatibility::{Cause, Incompatibility};
use crate::package::Package;
use crate::partial_solution::{AssignmentCause, PartialSolution};
use crate::source::PackageSource;
use crate::term::Term;
use crate::type_aliases::{Map, SelectedDependencies};

/// Outcome of checking one incompatibility against the partial solution.
enum Propagation {
    /// The incompatibility cannot trigger anything for now.
    Vacuous,
    /// A new term was derived for this package.
    Changed(Package),
    /// Every term is satisfied.
    Conflict,
}

/// Solver holding the state of the version solving algorithm.
pub struct VersionSolver<'a, S: PackageSource> {
    source: &'a S,
    /// All incompatibilities, indexed by each package their terms mention.
    incompatibilities: Map<Package, Vec<Rc<Incompatibility<S::V>>>>,
    solution: PartialSolution<S::V>,
    /// Versions whose dependencies were already fetched from the source.
    fetched: Map<Package, BTreeSet<S::V>>,
}

/// Solve the dependencies of the source's root package.
///
/// The returned map contains the root package with its synthetic version.
pub fn resolve<S: PackageSource>(
    source: &S,
) -> Result<SelectedDependencies<S::V>, SolveError<S::V>> {
    VersionSolver::new(source).solve()
}

impl<'a, S: PackageSource> VersionSolver<'a, S> {
    /// Fresh solver, seeded with the incompatibility requiring the root
    /// package to be selected.
    pub fn new(source: &'a S) -> Self {
        let mut solver = Self {
            source,
            incompatibilities: Map::default(),
            solution: PartialSolution::new(),
            fetched: Map::default(),
        };
        let root = Term::new(Constraint::any(Package::Root), false);
        solver.add_incompatibility(Rc::new(Incompatibility::new(vec![root], Cause::Root)));
        solver
    }

    /// Run the algorithm to completion.
    ///
    /// The result only depends on the source's content, running twice on an
    /// unchanged source returns the same decisions in the same order.
    pub fn solve(&mut self) -> Result<SelectedDependencies<S::V>, SolveError<S::V>> {
        let mut next = Package::Root;
        loop {
            self.propagate(next)?;
            match self.choose_package_version()? {
                Some(package) => next = package,
                None => {
                    info!("solution found after {} assignments", self.solution.assignments().len());
                    return Ok(self.solution.decisions().clone());
                }
            }
        }
    }

    fn add_incompatibility(&mut self, incompatibility: Rc<Incompatibility<S::V>>) {
        debug!("fact: {incompatibility}");
        for term in incompatibility.terms() {
            self.incompatibilities
                .entry(term.package().clone())
                .or_default()
                .push(Rc::clone(&incompatibility));
        }
    }

    /// Unit propagation from the given package until a fixed point.
    fn propagate(&mut self, package: Package) -> Result<(), SolveError<S::V>> {
        let mut changed = VecDeque::from([package]);
        while let Some(package) = changed.pop_front() {
            // Conflict resolution and decision making both push to this
            // list, snapshot it. Most recently added incompatibilities are
            // the most likely to trigger, check them first.
            let incompatibilities = self
                .incompatibilities
                .get(&package)
                .cloned()
                .unwrap_or_default();
            for incompatibility in incompatibilities.iter().rev() {
                match self.propagate_incompatibility(incompatibility) {
                    Propagation::Vacuous => {}
                    Propagation::Changed(changed_package) => {
                        if !changed.contains(&changed_package) {
                            changed.push_back(changed_package);
                        }
                    }
                    Propagation::Conflict => {
                        let root_cause = self.resolve_conflict(Rc::clone(incompatibility))?;
                        changed.clear();
                        match self.propagate_incompatibility(&root_cause) {
                            Propagation::Changed(changed_package) => {
                                changed.push_back(changed_package)
                            }
                            _ => unreachable!(
                                "the root cause must be almost satisfied after backjumping"
                            ),
                        }
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Derive the negation of the single unsatisfied term, if there is
    /// exactly one and no term contradicts the partial solution.
    fn propagate_incompatibility(
        &mut self,
        incompatibility: &Rc<Incompatibility<S::V>>,
    ) -> Propagation {
        let mut unsatisfied: Option<&Term<S::V>> = None;
        for term in incompatibility.terms() {
            match self.solution.relation(term) {
                SetRelation::Disjoint => return Propagation::Vacuous,
                SetRelation::Overlap => {
                    if unsatisfied.is_some() {
                        return Propagation::Vacuous;
                    }
                    unsatisfied = Some(term);
                }
                SetRelation::Subset => {}
            }
        }
        match unsatisfied {
            None => Propagation::Conflict,
            Some(term) => {
                let derived = term.invert();
                debug!("derived: {derived}");
                self.solution.derive(derived, Rc::clone(incompatibility));
                Propagation::Changed(term.package().clone())
            }
        }
    }

    /// Backjump out of a conflict, learning a new incompatibility from its
    /// causes, or fail with the proof when the conflict reaches the root.
    fn resolve_conflict(
        &mut self,
        mut incompatibility: Rc<Incompatibility<S::V>>,
    ) -> Result<Rc<Incompatibility<S::V>>, SolveError<S::V>> {
        info!("conflict: {incompatibility}");
        let mut learned = false;
        while !incompatibility.is_failure() {
            let pivot;
            let satisfier_term;
            let satisfier_level;
            let satisfier_is_decision;
            let satisfier_cause;
            let difference;
            let previous_level;
            {
                // The pivot is the term whose satisfier appears last in the
                // assignment log. The previous level is the highest level
                // among every other involved satisfier.
                let mut most_recent_term: Option<&Term<S::V>> = None;
                let mut most_recent_satisfier = None;
                let mut diff: Option<Term<S::V>> = None;
                let mut prev_level: u32 = 1;
                for term in incompatibility.terms() {
                    let satisfier = self.solution.satisfier(term);
                    match most_recent_satisfier {
                        None => {
                            most_recent_term = Some(term);
                            most_recent_satisfier = Some(satisfier);
                        }
                        Some(current) if current.index() < satisfier.index() => {
                            prev_level = prev_level.max(current.decision_level());
                            most_recent_term = Some(term);
                            most_recent_satisfier = Some(satisfier);
                            diff = None;
                        }
                        Some(_) => {
                            prev_level = prev_level.max(satisfier.decision_level());
                        }
                    }
                    if most_recent_term == Some(term) {
                        if let Some(satisfier) = most_recent_satisfier {
                            // When the satisfier only partially covers the
                            // pivot, the rest of it was satisfied earlier
                            // and bounds the backjump too.
                            let d = satisfier.term().difference(term);
                            diff = if d.is_empty() {
                                None
                            } else {
                                prev_level = prev_level
                                    .max(self.solution.satisfier(&d.invert()).decision_level());
                                Some(d)
                            };
                        }
                    }
                }
                let satisfier =
                    most_recent_satisfier.expect("an incompatibility has at least one term");
                pivot = most_recent_term
                    .expect("an incompatibility has at least one term")
                    .clone();
                satisfier_term = satisfier.term().clone();
                satisfier_level = satisfier.decision_level();
                satisfier_is_decision = satisfier.is_decision();
                satisfier_cause = match satisfier.cause() {
                    AssignmentCause::Decision => None,
                    AssignmentCause::Derivation(cause) => Some(Rc::clone(cause)),
                };
                difference = diff;
                previous_level = prev_level;
            }

            if previous_level < satisfier_level || satisfier_is_decision {
                debug!("backtracking to decision level {previous_level}");
                self.solution.backtrack(previous_level);
                if learned {
                    self.add_incompatibility(Rc::clone(&incompatibility));
                }
                return Ok(incompatibility);
            }

            // Rule of resolution: merge the conflict with the cause of the
            // pivot's satisfier, eliminating the pivot package.
            let cause = satisfier_cause.expect("a non-decision assignment has a cause");
            let mut terms: Vec<Term<S::V>> = incompatibility
                .terms()
                .iter()
                .filter(|t| *t != &pivot)
                .cloned()
                .collect();
            terms.extend(
                cause
                    .terms()
                    .iter()
                    .filter(|t| t.package() != pivot.package())
                    .cloned(),
            );
            if let Some(difference) = &difference {
                terms.push(difference.invert());
            }
            debug!(
                "! {pivot} is{} satisfied by {satisfier_term}",
                if difference.is_some() { " partially" } else { "" }
            );
            debug!("! which is caused by {cause}");
            incompatibility = Rc::new(Incompatibility::new(
                terms,
                Cause::Conflict {
                    conflict: Rc::clone(&incompatibility),
                    other: cause,
                },
            ));
            learned = true;
            debug!("! thus {incompatibility}");
        }
        Err(SolveError::NoSolution(incompatibility))
    }

    /// Pick the next package and version to decide on, or `None` when the
    /// partial solution is complete.
    fn choose_package_version(&mut self) -> Result<Option<Package>, SolveError<S::V>> {
        let unsatisfied: Vec<Term<S::V>> =
            self.solution.unsatisfied().into_iter().cloned().collect();
        if unsatisfied.is_empty() {
            return Ok(None);
        }

        // Work on the most constrained package first: fewest matching
        // versions, ties broken by fewest versions above the allowed range
        // (a conflict there has nowhere to escape to). Any other choice
        // would be correct too, this one only tends to fail faster.
        let mut best: Option<(usize, usize, &Term<S::V>, Vec<S::V>)> = None;
        for term in &unsatisfied {
            let versions = self.matching_versions(term)?;
            let higher = self.higher_versions(term)?;
            let better = match &best {
                None => true,
                Some((m, h, _, _)) => (versions.len(), higher) < (*m, *h),
            };
            if better {
                best = Some((versions.len(), higher, term, versions));
            }
        }
        let (_, _, term, versions) = best.expect("unsatisfied is not empty");

        let package = term.package().clone();
        let Some(version) = versions.first().cloned() else {
            debug!("no versions of {package} match {}", term.constraint().set());
            let no_versions = Rc::new(Incompatibility::new(
                vec![term.clone()],
                Cause::NoVersions,
            ));
            self.add_incompatibility(no_versions);
            return Ok(Some(package));
        };

        info!("selecting {package} {version}");
        if self
            .fetched
            .entry(package.clone())
            .or_default()
            .insert(version.clone())
        {
            let incompatibilities = self
                .source
                .incompatibilities_for(&package, &version)
                .map_err(|source| SolveError::ErrorRetrievingDependencies {
                    package: package.clone(),
                    version: version.clone(),
                    source,
                })?;
            let mut conflict = false;
            for incompatibility in incompatibilities {
                let incompatibility = Rc::new(incompatibility);
                // Deciding this version would immediately satisfy the
                // incompatibility, better not to.
                conflict = conflict
                    || incompatibility
                        .terms()
                        .iter()
                        .all(|t| t.package() == &package || self.solution.satisfies(t));
                self.add_incompatibility(incompatibility);
            }
            if conflict {
                return Ok(Some(package));
            }
        }
        self.solution.decide(package.clone(), version);
        Ok(Some(package))
    }

    fn matching_versions(&self, term: &Term<S::V>) -> Result<Vec<S::V>, SolveError<S::V>> {
        self.source
            .versions_for(term.package(), term.constraint().set())
            .map_err(|source| SolveError::ErrorRetrievingVersions {
                package: term.package().clone(),
                source,
            })
    }

    fn higher_versions(&self, term: &Term<S::V>) -> Result<usize, SolveError<S::V>> {
        let above = term.constraint().upper_invert();
        self.source
            .versions_for(above.package(), above.set())
            .map(|versions| versions.len())
            .map_err(|source| SolveError::ErrorRetrievingVersions {
                package: term.package().clone(),
                source,
            })
    }
}
