// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Publicly exported type aliases.

use crate::package::Package;

/// Map implementation used by the library.
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// Concrete dependencies picked by the library during
/// [solve](crate::solver::VersionSolver::solve), in decision order.
/// The root package is included with its synthetic version.
pub type SelectedDependencies<V> = indexmap::IndexMap<Package, V>;
