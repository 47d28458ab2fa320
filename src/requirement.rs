// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rubygems-flavored requirement syntax.
//!
//! A requirement is a comma-separated conjunction of clauses, each made of
//! an optional operator (`=`, `!=`, `>`, `>=`, `<`, `<=`, `~>`, defaulting
//! to `=`) and a version with one to three numeric segments. Missing
//! segments are taken as zero: `1.2` places the same lower bound as
//! `1.2.0`, but `~> 1.2` allows everything below `2.0.0` while `~> 1.2.0`
//! stops at `1.3.0`.

use thiserror::Error;

use crate::constraint::Constraint;
use crate::package::Package;
use crate::range::{Range, VersionSet};
use crate::version::SemanticVersion;

/// Error parsing a requirement string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequirementError {
    /// The clause starts with an operator the syntax does not know.
    #[error("unknown operator {operator:?} in requirement {clause:?}")]
    UnknownOperator {
        /// The unrecognized operator.
        operator: String,
        /// The clause it appeared in.
        clause: String,
    },
    /// The version part of a clause is not one to three dotted numbers.
    #[error("cannot parse version {0:?}")]
    InvalidVersion(String),
    /// A clause has an operator but nothing after it.
    #[error("missing version in requirement clause {0:?}")]
    MissingVersion(String),
}

/// Parse a requirement into a set of versions.
///
/// An empty requirement allows every version.
pub fn parse_requirement(text: &str) -> Result<VersionSet<SemanticVersion>, RequirementError> {
    if text.trim().is_empty() {
        return Ok(VersionSet::any());
    }
    let mut set = VersionSet::any();
    for clause in text.split(',') {
        set = set.intersect(&parse_clause(clause)?);
    }
    Ok(set)
}

/// Parse a requirement into a constraint on the given package.
pub fn parse_constraint(
    package: Package,
    text: &str,
) -> Result<Constraint<SemanticVersion>, RequirementError> {
    Constraint::parse(package, text, parse_requirement)
}

fn parse_clause(clause: &str) -> Result<VersionSet<SemanticVersion>, RequirementError> {
    let clause = clause.trim();
    let split = clause
        .find(|c: char| !"=!<>~".contains(c))
        .unwrap_or(clause.len());
    let (operator, rest) = clause.split_at(split);
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(RequirementError::MissingVersion(clause.to_string()));
    }
    let (version, segments) = parse_version_lenient(rest)?;
    Ok(match operator {
        "" | "=" => VersionSet::exact(version),
        "!=" => VersionSet::exact(version).invert(),
        ">" => Range::above(version).into(),
        // ">= 0" is the conventional spelling of "anything".
        ">=" if version == SemanticVersion::zero() => VersionSet::any(),
        ">=" => Range::at_least(version).into(),
        "<" => Range::below(version).into(),
        "<=" => Range::at_most(version).into(),
        "~>" => {
            let upper = if segments == 3 {
                version.bump_minor()
            } else {
                version.bump_major()
            };
            Range::between(version, upper).into()
        }
        _ => {
            return Err(RequirementError::UnknownOperator {
                operator: operator.to_string(),
                clause: clause.to_string(),
            })
        }
    })
}

fn parse_version_lenient(text: &str) -> Result<(SemanticVersion, usize), RequirementError> {
    let parts: Vec<&str> = text.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(RequirementError::InvalidVersion(text.to_string()));
    }
    let mut numbers = [0u32; 3];
    for (i, part) in parts.iter().enumerate() {
        numbers[i] = part
            .parse()
            .map_err(|_| RequirementError::InvalidVersion(text.to_string()))?;
    }
    Ok((
        SemanticVersion::new(numbers[0], numbers[1], numbers[2]),
        parts.len(),
    ))
}

// TESTS #######################################################################
