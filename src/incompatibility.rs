// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An incompatibility is a set of terms that cannot all hold at once.

use std::fmt::{self, Display};
use std::rc::Rc;

use crate::package::Package;
use crate::term::Term;
use crate::version::Version;

/// Where an incompatibility comes from.
#[derive(Debug, Clone)]
pub enum Cause<V: Version> {
    /// The initial clause requiring the root package to be selected.
    Root,
    /// A declared dependency of a package on another.
    Dependency,
    /// No version of a package satisfied its accumulated constraint.
    NoVersions,
    /// A package declared a dependency on a package that does not exist.
    InvalidDependency(Package),
    /// Derived by conflict resolution from two prior incompatibilities.
    Conflict {
        /// The incompatibility that was found satisfied.
        conflict: Rc<Incompatibility<V>>,
        /// The cause of the pivot term's satisfier.
        other: Rc<Incompatibility<V>>,
    },
}

/// A set of terms that cannot all be satisfied together.
///
/// Terms are kept in first-occurrence order with at most one term per
/// package: duplicate packages are merged by term intersection at
/// construction time.
#[derive(Debug, Clone)]
pub struct Incompatibility<V: Version> {
    terms: Vec<Term<V>>,
    cause: Cause<V>,
}

impl<V: Version> Incompatibility<V> {
    /// Build an incompatibility, normalizing its terms.
    ///
    /// Panics if two terms of the same package merge to an empty term,
    /// which would make the incompatibility a tautology.
    pub fn new(terms: Vec<Term<V>>, cause: Cause<V>) -> Self {
        let terms = Self::cleanup_terms(terms, &cause);
        Self { terms, cause }
    }

    fn cleanup_terms(mut terms: Vec<Term<V>>, cause: &Cause<V>) -> Vec<Term<V>> {
        if terms.len() != 1 && matches!(cause, Cause::Conflict { .. }) {
            // The root package is always selected, derived clauses gain
            // nothing from saying so.
            terms.retain(|t| !(t.positive() && t.package().is_root()));
        }
        if terms.len() <= 1 || (terms.len() == 2 && terms[0].package() != terms[1].package()) {
            return terms;
        }
        let mut merged: indexmap::IndexMap<Package, Term<V>> =
            indexmap::IndexMap::with_capacity(terms.len());
        for term in terms {
            match merged.entry(term.package().clone()) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    let combined = entry.get().intersect(&term);
                    assert!(
                        !combined.is_empty(),
                        "incompatibility should not have an empty term: {combined}"
                    );
                    entry.insert(combined);
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(term);
                }
            }
        }
        merged.into_values().collect()
    }

    /// The terms of the incompatibility.
    pub fn terms(&self) -> &[Term<V>] {
        &self.terms
    }

    /// Where this incompatibility comes from.
    pub fn cause(&self) -> &Cause<V> {
        &self.cause
    }

    /// Was this incompatibility derived by conflict resolution?
    pub fn is_conflict(&self) -> bool {
        matches!(self.cause, Cause::Conflict { .. })
    }

    /// Does this incompatibility on its own prove that solving failed?
    ///
    /// That is the case when it has no terms, or when its only term
    /// requires the root package, which is always selected.
    pub fn is_failure(&self) -> bool {
        self.terms.is_empty()
            || (self.terms.len() == 1
                && self.terms[0].positive()
                && self.terms[0].package().is_root())
    }
}

impl<V: Version> Display for Incompatibility<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if matches!(self.cause, Cause::Dependency) && self.terms.len() == 2 {
            debug_assert!(self.terms[0].positive());
            debug_assert!(!self.terms[1].positive());
            return write!(
                f,
                "{} depends on {}",
                self.terms[0].describe(true),
                self.terms[1].invert()
            );
        }

        if self.is_failure() {
            return f.write_str("version solving has failed");
        }

        if self.terms.len() == 1 {
            let term = &self.terms[0];
            return if term.positive() {
                write!(f, "{term} is forbidden")
            } else {
                write!(f, "{} is required", term.invert())
            };
        }

        let all_positive = self.terms.iter().all(|t| t.positive());
        let all_negative = self.terms.iter().all(|t| !t.positive());
        if all_positive {
            if self.terms.len() == 2 {
                write!(
                    f,
                    "{} is incompatible with {}",
                    self.terms[0], self.terms[1]
                )
            } else {
                let joined: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
                write!(f, "one of {} must be false", joined.join(" or "))
            }
        } else if all_negative {
            if self.terms.len() == 2 {
                write!(
                    f,
                    "either {} or {}",
                    self.terms[0].invert(),
                    self.terms[1].invert()
                )
            } else {
                let joined: Vec<String> =
                    self.terms.iter().map(|t| t.invert().to_string()).collect();
                write!(f, "one of {} must be true", joined.join(" or "))
            }
        } else {
            let positives: Vec<String> = self
                .terms
                .iter()
                .filter(|t| t.positive())
                .map(|t| t.to_string())
                .collect();
            let negatives: Vec<String> = self
                .terms
                .iter()
                .filter(|t| !t.positive())
                .map(|t| t.invert().to_string())
                .collect();
            if positives.len() == 1 {
                write!(f, "{} requires {}", positives[0], negatives.join(" or "))
            } else {
                write!(
                    f,
                    "if {} then {}",
                    positives.join(" and "),
                    negatives.join(" or ")
                )
            }
        }
    }
}

// TESTS #######################################################################
