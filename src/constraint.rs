// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A constraint is a set of versions attached to a specific package.

use std::fmt::{self, Display};

use crate::package::Package;
use crate::range::{Range, VersionSet};
use crate::version::Version;

/// How one set of versions relates to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRelation {
    /// Entirely contained in the other set.
    Subset,
    /// Shares some versions with the other set, but not contained in it.
    Overlap,
    /// Shares no version with the other set.
    Disjoint,
}

/// A set of versions of one package.
///
/// All binary operations require both sides to talk about the same package
/// and panic otherwise: comparing constraints of different packages is a
/// programming error, not a solvable situation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint<V: Version> {
    package: Package,
    set: VersionSet<V>,
}

impl<V: Version> Constraint<V> {
    /// Constraint from a package and a set of its versions.
    pub fn new(package: Package, set: VersionSet<V>) -> Self {
        Self { package, set }
    }

    /// Constraint allowing exactly one version.
    pub fn exact(package: Package, version: V) -> Self {
        Self::new(package, VersionSet::exact(version))
    }

    /// Constraint allowing every version of a package.
    pub fn any(package: Package) -> Self {
        Self::new(package, VersionSet::any())
    }

    /// Constraint from a textual requirement, parsed by the given adapter.
    ///
    /// The adapter decides the requirement syntax, see
    /// [parse_requirement](crate::requirement::parse_requirement) for the
    /// rubygems-flavored one.
    pub fn parse<E>(
        package: Package,
        requirement: &str,
        adapter: impl FnOnce(&str) -> Result<VersionSet<V>, E>,
    ) -> Result<Self, E> {
        Ok(Self::new(package, adapter(requirement)?))
    }

    /// The package this constraint is about.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The allowed set of versions.
    pub fn set(&self) -> &VersionSet<V> {
        &self.set
    }

    /// Does the constraint allow no version at all?
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Does the constraint allow every version?
    pub fn is_any(&self) -> bool {
        self.set.is_any()
    }

    fn check_package(&self, other: &Self) {
        assert_eq!(
            self.package, other.package,
            "cannot combine constraints of different packages"
        );
    }

    /// Versions allowed by both constraints.
    pub fn intersect(&self, other: &Self) -> Self {
        self.check_package(other);
        Self::new(self.package.clone(), self.set.intersect(&other.set))
    }

    /// Versions allowed by either constraint.
    pub fn union(&self, other: &Self) -> Self {
        self.check_package(other);
        Self::new(self.package.clone(), self.set.union(&other.set))
    }

    /// Versions allowed by this constraint but not the other.
    pub fn difference(&self, other: &Self) -> Self {
        self.intersect(&other.invert())
    }

    /// Versions not allowed by this constraint.
    pub fn invert(&self) -> Self {
        Self::new(self.package.clone(), self.set.invert())
    }

    /// Versions strictly above everything this constraint allows.
    pub fn upper_invert(&self) -> Self {
        Self::new(self.package.clone(), self.set.upper_invert())
    }

    /// How this constraint's set relates to the other's.
    pub fn relation(&self, other: &Self) -> SetRelation {
        self.check_package(other);
        if other.set.allows_all(&self.set) {
            SetRelation::Subset
        } else if self.set.intersects(&other.set) {
            SetRelation::Overlap
        } else {
            SetRelation::Disjoint
        }
    }

    /// Is this constraint entirely contained in the other?
    pub fn subset_of(&self, other: &Self) -> bool {
        self.relation(other) == SetRelation::Subset
    }

    /// Do the constraints share some versions, without containment?
    pub fn overlaps(&self, other: &Self) -> bool {
        self.relation(other) == SetRelation::Overlap
    }

    /// Do the constraints share no version at all?
    pub fn disjoint_with(&self, other: &Self) -> bool {
        self.relation(other) == SetRelation::Disjoint
    }

    /// Like `to_string`, with an explicit "every version of" wording for
    /// unrestricted constraints when the caller wants it.
    pub fn describe(&self, allow_every: bool) -> String {
        if allow_every && !self.package.is_root() && self.set.is_any() {
            format!("every version of {}", self.package)
        } else {
            self.to_string()
        }
    }
}

impl<V: Version> Display for Constraint<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The root package has a single synthetic version, spelling out its
        // set would only add noise to reports.
        if self.package.is_root() {
            f.write_str(self.package.name())
        } else {
            write!(f, "{} {}", self.package, self.set)
        }
    }
}

// TESTS #######################################################################
