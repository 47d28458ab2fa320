// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Package identifiers, including the synthetic root package.

use std::fmt::{self, Display};

/// A package identifier.
///
/// The root package stands for the project whose dependencies are being
/// solved. It always sorts before named packages, which are ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Package {
    /// The package at the root of the dependency graph.
    Root,
    /// A regular package, identified by its name.
    Named(String),
}

impl Package {
    /// Create a named package.
    pub fn named(name: impl Into<String>) -> Self {
        Package::Named(name.into())
    }

    /// The package name, `"root"` for the root package.
    pub fn name(&self) -> &str {
        match self {
            Package::Root => "root",
            Package::Named(name) => name,
        }
    }

    /// Is this the root package?
    pub fn is_root(&self) -> bool {
        matches!(self, Package::Root)
    }
}

impl Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Package {
    fn from(name: &str) -> Self {
        Package::named(name)
    }
}

// TESTS #######################################################################
