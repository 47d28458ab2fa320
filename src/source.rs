// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where the solver gets versions and dependencies from.

use std::collections::BTreeMap;
use std::error::Error;

use thiserror::Error;

use crate::constraint::Constraint;
use crate::incompatibility::{Cause, Incompatibility};
use crate::package::Package;
use crate::range::{Range, VersionSet};
use crate::term::Term;
use crate::type_aliases::Map;
use crate::version::Version;

/// Trait that allows the solver to retrieve available versions and
/// dependencies of packages.
pub trait PackageSource {
    /// The version type of this source.
    type V: Version;

    /// The versions of a package matching the given set, most preferred
    /// first. The order is the order in which the solver will try them.
    ///
    /// The root package must report exactly one version for the full set.
    fn versions_for(
        &self,
        package: &Package,
        set: &VersionSet<Self::V>,
    ) -> Result<Vec<Self::V>, Box<dyn Error>>;

    /// The dependencies of one version of a package, as incompatibilities.
    ///
    /// One dependency incompatibility per declared dependency, or a single
    /// invalid-dependency incompatibility when a dependency names a package
    /// the source does not know.
    fn incompatibilities_for(
        &self,
        package: &Package,
        version: &Self::V,
    ) -> Result<Vec<Incompatibility<Self::V>>, Box<dyn Error>>;
}

/// Error raised by [StaticPackageSource] when the solver asks about a
/// version that was never added.
#[derive(Error, Debug)]
#[error("no package {package} version {version} in the source")]
pub struct UnknownVersion {
    /// The package that was queried.
    pub package: Package,
    /// The unknown version, displayed.
    pub version: String,
}

/// A package source holding a fixed set of packages in memory.
///
/// Dependency incompatibilities widen the version they were asked about to
/// the contiguous run of versions declaring the same dependency: if every
/// version of `foo` needs `bar >= 1.0.0`, one incompatibility covers them
/// all and reports read "every version of foo" instead of one line per
/// version.
#[derive(Debug, Clone)]
pub struct StaticPackageSource<V: Version> {
    root_version: V,
    root_dependencies: Vec<(Package, VersionSet<V>)>,
    packages: Map<Package, BTreeMap<V, Vec<(Package, VersionSet<V>)>>>,
}

impl<V: Version> StaticPackageSource<V> {
    /// Empty source. The root package gets the given synthetic version.
    pub fn new(root_version: V) -> Self {
        Self {
            root_version,
            root_dependencies: Vec::new(),
            packages: Map::default(),
        }
    }

    /// Declare the dependencies of the root package.
    pub fn root(&mut self, dependencies: impl IntoIterator<Item = (Package, VersionSet<V>)>) {
        self.root_dependencies.extend(dependencies);
    }

    /// Add one version of a package with its dependencies.
    pub fn add(
        &mut self,
        package: impl Into<Package>,
        version: V,
        dependencies: impl IntoIterator<Item = (Package, VersionSet<V>)>,
    ) {
        self.packages
            .entry(package.into())
            .or_default()
            .insert(version, dependencies.into_iter().collect());
    }

    fn knows(&self, package: &Package) -> bool {
        package.is_root() || self.packages.contains_key(package)
    }

    fn incompatibilities(
        &self,
        package: &Package,
        dependencies: &[(Package, VersionSet<V>)],
        span: impl Fn(&Package, &VersionSet<V>) -> Range<V>,
    ) -> Vec<Incompatibility<V>> {
        let mut result = Vec::with_capacity(dependencies.len());
        for (dep_package, dep_set) in dependencies {
            let self_term = Term::new(
                Constraint::new(package.clone(), span(dep_package, dep_set).into()),
                true,
            );
            if !self.knows(dep_package) {
                return vec![Incompatibility::new(
                    vec![self_term],
                    Cause::InvalidDependency(dep_package.clone()),
                )];
            }
            let dep_term = Term::new(
                Constraint::new(dep_package.clone(), dep_set.clone()),
                false,
            );
            result.push(Incompatibility::new(
                vec![self_term, dep_term],
                Cause::Dependency,
            ));
        }
        result
    }
}

/// The contiguous run of versions around `sorted[index]` for which
/// `same_dependency` holds, as a half-open range. Unbounded on the sides
/// where the run reaches the end of the version list.
fn dependency_span<V: Version>(
    sorted: &[&V],
    index: usize,
    same_dependency: impl Fn(&V) -> bool,
) -> Range<V> {
    let mut low = index;
    while low > 0 && same_dependency(sorted[low - 1]) {
        low -= 1;
    }
    let mut high = index;
    while high + 1 < sorted.len() && same_dependency(sorted[high + 1]) {
        high += 1;
    }
    let min = (low > 0).then(|| sorted[low].clone());
    let max = (high + 1 < sorted.len()).then(|| sorted[high + 1].clone());
    Range::new(min, max, true, false)
}

impl<V: Version> PackageSource for StaticPackageSource<V> {
    type V = V;

    fn versions_for(
        &self,
        package: &Package,
        set: &VersionSet<V>,
    ) -> Result<Vec<V>, Box<dyn Error>> {
        if package.is_root() {
            let mut versions = Vec::with_capacity(1);
            if set.includes(&self.root_version) {
                versions.push(self.root_version.clone());
            }
            return Ok(versions);
        }
        Ok(match self.packages.get(package) {
            // Newest first.
            Some(versions) => versions
                .keys()
                .rev()
                .filter(|v| set.includes(v))
                .cloned()
                .collect(),
            None => Vec::new(),
        })
    }

    fn incompatibilities_for(
        &self,
        package: &Package,
        version: &V,
    ) -> Result<Vec<Incompatibility<V>>, Box<dyn Error>> {
        if package.is_root() {
            let span = |_: &Package, _: &VersionSet<V>| Range::any();
            return Ok(self.incompatibilities(package, &self.root_dependencies, span));
        }

        let unknown = || UnknownVersion {
            package: package.clone(),
            version: version.to_string(),
        };
        let versions = self.packages.get(package).ok_or_else(unknown)?;
        let dependencies = versions.get(version).ok_or_else(unknown)?;
        let sorted: Vec<&V> = versions.keys().collect();
        let index = sorted
            .iter()
            .position(|v| *v == version)
            .ok_or_else(unknown)?;

        let span = |dep_package: &Package, dep_set: &VersionSet<V>| {
            let same_dependency = |v: &V| {
                versions.get(v).is_some_and(|deps| {
                    deps.iter()
                        .any(|(p, s)| p == dep_package && s == dep_set)
                })
            };
            dependency_span(&sorted, index, same_dependency)
        };
        Ok(self.incompatibilities(package, dependencies, span))
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::NumberVersion;

    fn v(n: u32) -> NumberVersion {
        NumberVersion(n)
    }

    fn between(low: u32, high: u32) -> VersionSet<NumberVersion> {
        VersionSet::Range(Range::between(v(low), v(high)))
    }

    #[test]
    fn versions_are_newest_first() {
        let mut source = StaticPackageSource::new(v(0));
        source.add("foo", v(1), []);
        source.add("foo", v(2), []);
        source.add("foo", v(3), []);
        let versions = source
            .versions_for(&Package::named("foo"), &between(1, 3))
            .unwrap();
        assert_eq!(versions, vec![v(2), v(1)]);
    }

    #[test]
    fn shared_dependencies_collapse_to_one_incompatibility() {
        let mut source = StaticPackageSource::new(v(0));
        source.add("bar", v(1), []);
        source.add("foo", v(1), [(Package::named("bar"), between(1, 2))]);
        source.add("foo", v(2), [(Package::named("bar"), between(1, 2))]);

        let incompats = source
            .incompatibilities_for(&Package::named("foo"), &v(1))
            .unwrap();
        assert_eq!(incompats.len(), 1);
        // Both versions declare the same dependency, the span is unbounded.
        assert_eq!(
            incompats[0].to_string(),
            "every version of foo depends on bar >= 1, < 2"
        );
    }

    #[test]
    fn differing_dependencies_keep_their_own_span() {
        let mut source = StaticPackageSource::new(v(0));
        source.add("bar", v(1), []);
        source.add("bar", v(2), []);
        source.add("foo", v(1), [(Package::named("bar"), between(1, 2))]);
        source.add("foo", v(2), [(Package::named("bar"), between(2, 3))]);

        let incompats = source
            .incompatibilities_for(&Package::named("foo"), &v(2))
            .unwrap();
        assert_eq!(incompats.len(), 1);
        assert_eq!(
            incompats[0].to_string(),
            "foo >= 2 depends on bar >= 2, < 3"
        );
    }

    #[test]
    fn unknown_dependency_is_invalid() {
        let mut source = StaticPackageSource::new(v(0));
        source.add("foo", v(1), [(Package::named("mystery"), VersionSet::any())]);
        let incompats = source
            .incompatibilities_for(&Package::named("foo"), &v(1))
            .unwrap();
        assert_eq!(incompats.len(), 1);
        assert!(matches!(
            incompats[0].cause(),
            Cause::InvalidDependency(p) if p == &Package::named("mystery")
        ));
    }

    #[test]
    fn root_dependencies_span_everything() {
        let mut source = StaticPackageSource::new(v(0));
        source.add("foo", v(1), []);
        source.root([(Package::named("foo"), between(1, 2))]);
        let incompats = source
            .incompatibilities_for(&Package::Root, &v(0))
            .unwrap();
        assert_eq!(incompats.len(), 1);
        assert_eq!(incompats[0].to_string(), "root depends on foo >= 1, < 2");
    }
}
