// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Version solving for package dependencies.
//!
//! Version solving consists in efficiently finding a set of packages and versions
//! that satisfy all the constraints of a given project dependencies.
//! In addition, when that is not possible,
//! we should try to provide a very human-readable and clear
//! explanation as to why that failed.
//!
//! # Packages and versions
//!
//! Packages are identified by the [Package](package::Package) type:
//! either the synthetic root package standing for the project being solved,
//! or a named package from a registry.
//! Versions can be any type implementing the [Version](version::Version) trait,
//! which is automatic if the type already implements
//! `Clone + Ord + Debug + Display`.
//! For convenience, this library already provides two implementations.
//! The first one is [NumberVersion](version::NumberVersion),
//! basically a newtype for `u32`.
//! The second one is [SemanticVersion](version::SemanticVersion)
//! that implements semantic versioning rules.
//!
//! # Basic example
//!
//! Let's imagine that we are building a user interface
//! with a menu containing dropdowns with some icons,
//! icons that we are also directly using in other parts of the interface.
//! For this scenario our direct dependencies are `menu` and `icons`,
//! but the complete set of dependencies looks like follows:
//!
//! - `root` depends on `menu` and `icons`
//! - `menu` depends on `dropdown`
//! - `dropdown` depends on `icons`
//! - `icons` has no dependency
//!
//! We can model that scenario with this library as follows
//! ```
//! # use version_solver::package::Package;
//! # use version_solver::range::VersionSet;
//! # use version_solver::solver::resolve;
//! # use version_solver::source::StaticPackageSource;
//! # use version_solver::version::NumberVersion;
//! let mut source = StaticPackageSource::new(NumberVersion(1));
//! source.root(vec![
//!     (Package::named("menu"), VersionSet::any()),
//!     (Package::named("icons"), VersionSet::any()),
//! ]);
//! source.add(
//!     Package::named("menu"),
//!     NumberVersion(1),
//!     vec![(Package::named("dropdown"), VersionSet::any())],
//! );
//! source.add(
//!     Package::named("dropdown"),
//!     NumberVersion(1),
//!     vec![(Package::named("icons"), VersionSet::any())],
//! );
//! source.add(Package::named("icons"), NumberVersion(1), vec![]);
//!
//! // Run the solver.
//! let solution = resolve(&source).unwrap();
//! ```
//!
//! # The PackageSource trait
//!
//! In our previous example we used [StaticPackageSource](source::StaticPackageSource),
//! which is a basic implementation of the
//! [PackageSource](source::PackageSource) trait backed by in-memory maps.
//!
//! But we might want to implement the trait for our own type,
//! for example one backed by a registry on the network.
//! This may be done by implementing the two following methods.
//! ```ignore
//! impl PackageSource for MySource {
//!     type V = SemanticVersion;
//!
//!     fn versions_for(
//!         &self,
//!         package: &Package,
//!         set: &VersionSet<Self::V>,
//!     ) -> Result<Vec<Self::V>, Box<dyn Error>> {
//!         ...
//!     }
//!
//!     fn incompatibilities_for(
//!         &self,
//!         package: &Package,
//!         version: &Self::V,
//!     ) -> Result<Vec<Incompatibility<Self::V>>, Box<dyn Error>> {
//!         ...
//!     }
//! }
//! ```
//! The first method should return the versions of a package
//! contained in the given set, most preferred first.
//! The solver picks the first version of that list that causes no conflict,
//! so the order expresses your preference,
//! usually newest first.
//! The second method returns what is known about a given package version
//! as a list of incompatibilities,
//! one per dependency of that version.
//! Collapsing adjacent versions sharing a dependency into a single
//! incompatibility, as [StaticPackageSource](source::StaticPackageSource) does,
//! is not required for correctness but leads to much better error messages.
//!
//! The solver may ask for the versions of a package several times
//! as constraints narrow, but it never asks for the dependencies
//! of the same package version twice.
//! A source backed by the network should keep its own version index
//! cheap to query and may fetch dependencies lazily.
//!
//! # Solution and error reporting
//!
//! When everything goes well, [resolve](solver::resolve) finds and returns
//! the complete set of direct and indirect dependencies
//! satisfying all the constraints.
//! The packages and versions selected are returned in an `IndexMap`,
//! in the order decisions were made.
//! But sometimes there is no solution because dependencies are incompatible.
//! In such cases, `resolve(...)` returns a
//! [SolveError::NoSolution](error::SolveError::NoSolution)
//! holding the final incompatibility,
//! whose causes form the full chain of reasons why there is no solution.
//!
//! All the items in that chain are [incompatibilities](incompatibility::Incompatibility)
//! and may be of two types, either external or derived.
//! External incompatibilities have reasons that are independent
//! of the way this solver is implemented, such as
//!  - dependencies: every version of `foo` depends on `bar >= 1.0.0`
//!  - absence of version: there is no version of `foo` in `>= 3.0.0, < 4.0.0`
//!
//! Derived incompatibilities are obtained by the solver by deduction,
//! combining two previous incompatibilities during conflict resolution.
//!
//! The [FailureWriter](report::FailureWriter) walks that chain
//! and renders it as a numbered proof, ending with a line like
//! ```txt
//! So, because root depends on baz >= 1.0.0, < 2.0.0, version solving has failed.
//! ```
//! Displaying a `NoSolution` error prints that proof, so in most cases
//! ```ignore
//! match resolve(&source) {
//!     Ok(solution) => println!("{:?}", solution),
//!     Err(err) => eprintln!("{}", err),
//! };
//! ```
//! is all the reporting you need.

#![warn(missing_docs)]

pub mod constraint;
pub mod error;
pub mod incompatibility;
pub mod package;
pub mod partial_solution;
pub mod range;
pub mod report;
pub mod requirement;
pub mod solver;
pub mod source;
pub mod term;
pub mod type_aliases;
pub mod version;
