// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A term is a positive or negative statement about one package.

use std::fmt::{self, Display};

use crate::constraint::{Constraint, SetRelation};
use crate::package::Package;
use crate::version::Version;

/// A statement about a package selection.
///
/// A positive term is satisfied when the package is selected with a version
/// in its constraint. A negative term is satisfied when the package is not
/// selected with a version in its constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Term<V: Version> {
    constraint: Constraint<V>,
    positive: bool,
}

impl<V: Version> Term<V> {
    /// Build a term from a constraint and a polarity.
    pub fn new(constraint: Constraint<V>, positive: bool) -> Self {
        Self {
            constraint,
            positive,
        }
    }

    /// The package the term talks about.
    pub fn package(&self) -> &Package {
        self.constraint.package()
    }

    /// The raw constraint, before polarity is applied.
    pub fn constraint(&self) -> &Constraint<V> {
        &self.constraint
    }

    /// Is the term positive?
    pub fn positive(&self) -> bool {
        self.positive
    }

    /// The set of versions the term allows the package to take, as a
    /// positive constraint. The constraint itself for a positive term, its
    /// complement for a negative one.
    pub fn normalized_constraint(&self) -> Constraint<V> {
        if self.positive {
            self.constraint.clone()
        } else {
            self.constraint.invert()
        }
    }

    /// The negation of the term.
    pub fn invert(&self) -> Self {
        Self::new(self.constraint.clone(), !self.positive)
    }

    /// The strongest term implied by both terms together.
    pub fn intersect(&self, other: &Self) -> Self {
        match (self.positive, other.positive) {
            (true, true) => Self::new(self.constraint.intersect(&other.constraint), true),
            (false, false) => Self::new(self.constraint.union(&other.constraint), false),
            (true, false) => Self::new(
                self.constraint.intersect(&other.constraint.invert()),
                true,
            ),
            (false, true) => Self::new(
                other.constraint.intersect(&self.constraint.invert()),
                true,
            ),
        }
    }

    /// The part of this term not covered by the other.
    pub fn difference(&self, other: &Self) -> Self {
        self.intersect(&other.invert())
    }

    /// How this term relates to the other, polarity included.
    ///
    /// The polarity-preserving intersection decides: equal to this term
    /// means this term already implies the other, an empty positive
    /// intersection means the two cannot hold together. A negative term
    /// never implies a positive one, since it also holds when the package
    /// is not selected at all, and two negative terms are never disjoint
    /// for the same reason.
    pub fn relation(&self, other: &Self) -> SetRelation {
        let intersection = self.intersect(other);
        if intersection == *self {
            SetRelation::Subset
        } else if intersection.positive && intersection.constraint.is_empty() {
            SetRelation::Disjoint
        } else {
            SetRelation::Overlap
        }
    }

    /// Does this term holding imply the other term holds?
    pub fn satisfies(&self, other: &Self) -> bool {
        self.relation(other) == SetRelation::Subset
    }

    /// Does the term admit no selection at all?
    pub fn is_empty(&self) -> bool {
        self.normalized_constraint().is_empty()
    }

    /// Like `to_string`, with "every version of" wording for unrestricted
    /// positive terms when the caller wants it.
    pub fn describe(&self, allow_every: bool) -> String {
        if self.positive {
            self.constraint.describe(allow_every)
        } else {
            format!("not {}", self.constraint)
        }
    }
}

impl<V: Version> Display for Term<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe(false))
    }
}

// TESTS #######################################################################
