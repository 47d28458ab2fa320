// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Traits and implementations to create and compare versions.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use thiserror::Error;

/// Versions are ordered values that can be cloned and displayed.
///
/// Nothing more is required: ranges are continuous intervals with inclusive
/// or exclusive bounds, so the solver never needs a "smallest version" or a
/// "next version" from the version type itself.
pub trait Version: Clone + Ord + Debug + Display {}

/// Automatically implement the [Version] trait for everything that fits.
impl<V: Clone + Ord + Debug + Display> Version for V {}

/// Type for semantic versions: major.minor.patch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

// Constructors
impl SemanticVersion {
    /// Create a version with "major", "minor" and "patch" values.
    /// `version = major.minor.patch`
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version 0.0.0.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Version 1.0.0.
    pub fn one() -> Self {
        Self::new(1, 0, 0)
    }
}

// Accessors
impl SemanticVersion {
    /// Major version.
    pub fn major(self) -> u32 {
        self.major
    }

    /// Minor version.
    pub fn minor(self) -> u32 {
        self.minor
    }

    /// Patch version.
    pub fn patch(self) -> u32 {
        self.patch
    }
}

// Increment versions
impl SemanticVersion {
    /// Smallest version strictly above any `major.x.y`.
    pub fn bump_major(self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    /// Smallest version strictly above any `major.minor.x`.
    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    /// Smallest version strictly above `self`.
    pub fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

/// Error creating [SemanticVersion] from [String].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionParseError {
    /// [SemanticVersion] must contain major, minor, patch versions.
    #[error("version {full_version} must contain 3 numbers separated by dot")]
    NotThreeParts {
        /// [SemanticVersion] that was being parsed.
        full_version: String,
    },
    /// [SemanticVersion] must contain numbers.
    #[error("cannot parse number in {full_version}")]
    ParseIntError {
        /// [SemanticVersion] that was being parsed.
        full_version: String,
        /// A version part where parsing failed.
        version_part: String,
    },
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_number = |part: &str| {
            part.parse::<u32>().map_err(|_| Self::Err::ParseIntError {
                full_version: s.to_string(),
                version_part: part.to_string(),
            })
        };

        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), Some(patch), None) => {
                let major = parse_number(major)?;
                let minor = parse_number(minor)?;
                let patch = parse_number(patch)?;
                Ok(Self {
                    major,
                    minor,
                    patch,
                })
            }
            _ => Err(Self::Err::NotThreeParts {
                full_version: s.to_string(),
            }),
        }
    }
}

impl Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Simplest versions possible, just a positive number.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NumberVersion(pub u32);

impl Display for NumberVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NumberVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

// TESTS #######################################################################
