// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Handling of the failures that can occur while solving dependencies.

use std::rc::Rc;

use thiserror::Error;

use crate::incompatibility::Incompatibility;
use crate::package::Package;
use crate::report::FailureWriter;
use crate::version::Version;

/// Errors that may occur while solving dependencies.
#[derive(Error, Debug)]
pub enum SolveError<V: Version> {
    /// There is no solution for this set of dependencies.
    /// The conclusion of the whole failure derivation, displayed as a
    /// numbered proof.
    #[error("{}", FailureWriter::new(.0).write())]
    NoSolution(Rc<Incompatibility<V>>),

    /// Error arising when the package source failed to list the versions
    /// of a package.
    #[error("failed to list versions of {package}")]
    ErrorRetrievingVersions {
        /// Package whose versions were requested.
        package: Package,
        /// Error raised by the package source.
        source: Box<dyn std::error::Error>,
    },

    /// Error arising when the package source failed to retrieve the
    /// dependencies of a package.
    #[error("failed to retrieve dependencies of {package} {version}")]
    ErrorRetrievingDependencies {
        /// Package whose dependencies were requested.
        package: Package,
        /// Version of the package whose dependencies were requested.
        version: V,
        /// Error raised by the package source.
        source: Box<dyn std::error::Error>,
    },
}
