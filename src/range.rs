// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ranges are constraints defining sets of versions.
//!
//! A [Range] is a single continuous interval, possibly unbounded on either
//! side, with inclusive or exclusive bounds. A [VersionSet] is what range
//! algebra actually closes over: the empty set, a single range, or a
//! normalized union of two or more disjoint, non-contiguous ranges sorted
//! by lower bound.
//!
//! Set operations (`intersect`, `union`, `invert`, ...) always return
//! normalized values, so structural equality is semantic equality.

use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::version::Version;

/// A continuous, non-empty interval of versions.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range<V: Version> {
    min: Option<V>,
    max: Option<V>,
    include_min: bool,
    include_max: bool,
}

/// A set of versions: empty, one range, or a union of disjoint ranges.
///
/// The `Union` variant always holds at least two ranges, sorted by lower
/// bound, pairwise disjoint and non-contiguous. Degenerate unions collapse
/// to `Range` or `Empty` during normalization.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VersionSet<V: Version> {
    /// The set containing no version.
    Empty,
    /// A single continuous interval.
    Range(Range<V>),
    /// At least two disjoint, non-contiguous intervals.
    Union(Vec<Range<V>>),
}

// Range constructors #########################################################

impl<V: Version> Range<V> {
    /// General constructor.
    ///
    /// A `None` bound means unbounded on that side. Panics if the bounds
    /// describe an empty or inverted interval: use [VersionSet::Empty] for
    /// the empty set.
    pub fn new(min: Option<V>, max: Option<V>, include_min: bool, include_max: bool) -> Self {
        let include_min = include_min && min.is_some();
        let include_max = include_max && max.is_some();
        if let (Some(lo), Some(hi)) = (&min, &max) {
            match lo.cmp(hi) {
                Ordering::Greater => panic!("range minimum {lo} is above its maximum {hi}"),
                Ordering::Equal => assert!(
                    include_min && include_max,
                    "a range with equal bounds must include both of them"
                ),
                Ordering::Less => {}
            }
        }
        Self {
            min,
            max,
            include_min,
            include_max,
        }
    }

    /// The range containing every version.
    pub fn any() -> Self {
        Self::new(None, None, false, false)
    }

    /// The range containing exactly one version.
    pub fn exact(version: V) -> Self {
        Self::new(Some(version.clone()), Some(version), true, true)
    }

    /// Set of all versions higher or equal to some version.
    pub fn at_least(version: V) -> Self {
        Self::new(Some(version), None, true, false)
    }

    /// Set of all versions strictly higher than some version.
    pub fn above(version: V) -> Self {
        Self::new(Some(version), None, false, false)
    }

    /// Set of all versions lower or equal to some version.
    pub fn at_most(version: V) -> Self {
        Self::new(None, Some(version), false, true)
    }

    /// Set of all versions strictly lower than some version.
    pub fn below(version: V) -> Self {
        Self::new(None, Some(version), false, false)
    }

    /// Set of versions greater or equal to `low`, strictly lower than `high`.
    pub fn between(low: V, high: V) -> Self {
        Self::new(Some(low), Some(high), true, false)
    }
}

// Range accessors ############################################################

impl<V: Version> Range<V> {
    /// Lower bound, `None` when unbounded below.
    pub fn min(&self) -> Option<&V> {
        self.min.as_ref()
    }

    /// Upper bound, `None` when unbounded above.
    pub fn max(&self) -> Option<&V> {
        self.max.as_ref()
    }

    /// Is the lower bound part of the range?
    pub fn include_min(&self) -> bool {
        self.include_min
    }

    /// Is the upper bound part of the range?
    pub fn include_max(&self) -> bool {
        self.include_max
    }

    /// Does this range contain every version?
    pub fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Does this range contain exactly one version?
    pub fn is_exact(&self) -> bool {
        self.include_min && self.include_max && self.min == self.max
    }
}

// Range set operations #######################################################

impl<V: Version> Range<V> {
    /// Where a version sits relative to the range: `Less` when below the
    /// lower bound, `Greater` when above the upper bound, `Equal` inside.
    pub fn compare_version(&self, version: &V) -> Ordering {
        if let Some(min) = &self.min {
            match version.cmp(min) {
                Ordering::Less => return Ordering::Less,
                Ordering::Equal if !self.include_min => return Ordering::Less,
                _ => {}
            }
        }
        if let Some(max) = &self.max {
            match version.cmp(max) {
                Ordering::Greater => return Ordering::Greater,
                Ordering::Equal if !self.include_max => return Ordering::Greater,
                _ => {}
            }
        }
        Ordering::Equal
    }

    /// Check if a range contains a given version.
    pub fn includes(&self, version: &V) -> bool {
        self.compare_version(version) == Ordering::Equal
    }

    /// Is every version in this range below every version in the other?
    pub fn strictly_lower(&self, other: &Self) -> bool {
        match (&self.max, &other.min) {
            (Some(max), Some(min)) => match max.cmp(min) {
                Ordering::Less => true,
                Ordering::Equal => !(self.include_max && other.include_min),
                Ordering::Greater => false,
            },
            _ => false,
        }
    }

    /// Do the two ranges share at least one version?
    pub fn intersects(&self, other: &Self) -> bool {
        !self.strictly_lower(other) && !other.strictly_lower(self)
    }

    /// Computes the intersection of two ranges, `None` when disjoint.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        let (min, include_min) = match (&self.min, &other.min) {
            (None, None) => (None, false),
            (None, Some(m)) => (Some(m.clone()), other.include_min),
            (Some(m), None) => (Some(m.clone()), self.include_min),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => (Some(a.clone()), self.include_min),
                Ordering::Less => (Some(b.clone()), other.include_min),
                Ordering::Equal => (Some(a.clone()), self.include_min && other.include_min),
            },
        };
        let (max, include_max) = match (&self.max, &other.max) {
            (None, None) => (None, false),
            (None, Some(m)) => (Some(m.clone()), other.include_max),
            (Some(m), None) => (Some(m.clone()), self.include_max),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => (Some(a.clone()), self.include_max),
                Ordering::Greater => (Some(b.clone()), other.include_max),
                Ordering::Equal => (Some(a.clone()), self.include_max && other.include_max),
            },
        };
        Some(Self::new(min, max, include_min, include_max))
    }

    /// The smallest range covering both ranges.
    ///
    /// Only meaningful for intersecting or contiguous ranges, where the
    /// result contains nothing besides the two inputs.
    pub fn span(&self, other: &Self) -> Self {
        let (min, include_min) = match (&self.min, &other.min) {
            (None, _) | (_, None) => (None, false),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => (Some(a.clone()), self.include_min),
                Ordering::Greater => (Some(b.clone()), other.include_min),
                Ordering::Equal => (Some(a.clone()), self.include_min || other.include_min),
            },
        };
        let (max, include_max) = match (&self.max, &other.max) {
            (None, _) | (_, None) => (None, false),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => (Some(a.clone()), self.include_max),
                Ordering::Less => (Some(b.clone()), other.include_max),
                Ordering::Equal => (Some(a.clone()), self.include_max || other.include_max),
            },
        };
        Self::new(min, max, include_min, include_max)
    }

    /// Do the ranges intersect or touch, so that their span contains
    /// nothing besides them?
    pub fn contiguous_to(&self, other: &Self) -> bool {
        if self.intersects(other) {
            return true;
        }
        let touches = |max: &Option<V>, include_max: bool, min: &Option<V>, include_min: bool| {
            match (max, min) {
                (Some(a), Some(b)) => a == b && (include_max || include_min),
                _ => false,
            }
        };
        touches(&self.max, self.include_max, &other.min, other.include_min)
            || touches(&other.max, other.include_max, &self.min, self.include_min)
    }

    /// Is the other range entirely contained in this one?
    pub fn allows_all(&self, other: &Self) -> bool {
        let min_ok = match (&self.min, &other.min) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => self.include_min || !other.include_min,
            },
        };
        let max_ok = match (&self.max, &other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => self.include_max || !other.include_max,
            },
        };
        min_ok && max_ok
    }

    /// The set of all versions outside this range.
    pub fn invert(&self) -> VersionSet<V> {
        let low = self.min.clone().map(|min| {
            let include_max = !self.include_min;
            Self::new(None, Some(min), false, include_max)
        });
        let high = self.max.clone().map(|max| {
            let include_min = !self.include_max;
            Self::new(Some(max), None, include_min, false)
        });
        match (low, high) {
            (None, None) => VersionSet::Empty,
            (Some(r), None) | (None, Some(r)) => VersionSet::Range(r),
            (Some(low), Some(high)) => VersionSet::Union(vec![low, high]),
        }
    }

    /// The set of all versions strictly above this range.
    ///
    /// Empty when the range is unbounded above.
    pub fn upper_invert(&self) -> VersionSet<V> {
        match &self.max {
            None => VersionSet::Empty,
            Some(max) => {
                let include_min = !self.include_max;
                VersionSet::Range(Self::new(Some(max.clone()), None, include_min, false))
            }
        }
    }

    /// Computes the union of two ranges.
    pub fn union(&self, other: &Self) -> VersionSet<V> {
        VersionSet::normalize(vec![self.clone(), other.clone()])
    }

    fn bound_parts(&self) -> Vec<String> {
        if self.is_any() {
            return vec!["any".to_string()];
        }
        if self.is_exact() {
            return vec![self.min.as_ref().map(|v| v.to_string()).unwrap_or_default()];
        }
        let mut parts = Vec::with_capacity(2);
        if let Some(min) = &self.min {
            let op = if self.include_min { ">=" } else { ">" };
            parts.push(format!("{op} {min}"));
        }
        if let Some(max) = &self.max {
            let op = if self.include_max { "<=" } else { "<" };
            parts.push(format!("{op} {max}"));
        }
        parts
    }
}

impl<V: Version> Display for Range<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.bound_parts().join(", "))
    }
}

// VersionSet #################################################################

impl<V: Version> VersionSet<V> {
    /// The set containing no version.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// The set containing every version.
    pub fn any() -> Self {
        Self::Range(Range::any())
    }

    /// The set containing exactly one version.
    pub fn exact(version: V) -> Self {
        Self::Range(Range::exact(version))
    }

    /// The member ranges, in increasing order. Empty for the empty set.
    pub fn ranges(&self) -> &[Range<V>] {
        match self {
            Self::Empty => &[],
            Self::Range(range) => std::slice::from_ref(range),
            Self::Union(ranges) => ranges,
        }
    }

    /// Does the set contain no version at all?
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Does the set contain every version?
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Range(r) if r.is_any())
    }

    /// Check if the set contains a given version.
    pub fn includes(&self, version: &V) -> bool {
        self.ranges().iter().any(|r| r.includes(version))
    }

    /// Do the two sets share at least one version?
    pub fn intersects(&self, other: &Self) -> bool {
        self.ranges()
            .iter()
            .any(|a| other.ranges().iter().any(|b| a.intersects(b)))
    }

    /// Is the other set entirely contained in this one?
    pub fn allows_all(&self, other: &Self) -> bool {
        // Members are non-contiguous, so a contained range cannot straddle
        // two of them.
        other
            .ranges()
            .iter()
            .all(|o| self.ranges().iter().any(|s| s.allows_all(o)))
    }

    /// Computes the intersection of two sets.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        for a in self.ranges() {
            for b in other.ranges() {
                if let Some(r) = a.intersect(b) {
                    out.push(r);
                }
            }
        }
        Self::normalize(out)
    }

    /// Computes the union of two sets.
    pub fn union(&self, other: &Self) -> Self {
        Self::normalize(self.ranges().iter().chain(other.ranges()).cloned().collect())
    }

    /// Computes the union of any number of sets.
    pub fn union_of(sets: impl IntoIterator<Item = Self>) -> Self {
        Self::normalize(
            sets.into_iter()
                .flat_map(|set| set.ranges().to_vec())
                .collect(),
        )
    }

    /// The set of all versions outside this set.
    pub fn invert(&self) -> Self {
        match self {
            Self::Empty => Self::any(),
            Self::Range(r) => r.invert(),
            Self::Union(ranges) => ranges
                .iter()
                .map(|r| r.invert())
                .reduce(|a, b| a.intersect(&b))
                .unwrap_or_else(Self::any),
        }
    }

    /// The set of all versions strictly above every version of this set.
    pub fn upper_invert(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Range(r) => r.upper_invert(),
            // Members are sorted, only the last one bounds the set above.
            Self::Union(ranges) => ranges[ranges.len() - 1].upper_invert(),
        }
    }

    /// Sort ranges by lower bound and merge the contiguous ones, collapsing
    /// degenerate unions to [VersionSet::Range] or [VersionSet::Empty].
    fn normalize(mut ranges: Vec<Range<V>>) -> Self {
        ranges.sort_by(|a, b| match (a.min(), b.min()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            // Inclusive bounds sort before exclusive ones on the same version.
            (Some(x), Some(y)) => x.cmp(y).then(b.include_min().cmp(&a.include_min())),
        });
        let mut merged: Vec<Range<V>> = Vec::new();
        for range in ranges {
            match merged.last_mut() {
                Some(last) if last.contiguous_to(&range) => *last = last.span(&range),
                _ => merged.push(range),
            }
        }
        match merged.len() {
            0 => Self::Empty,
            1 => Self::Range(merged.swap_remove(0)),
            _ => Self::Union(merged),
        }
    }
}

impl<V: Version> From<Range<V>> for VersionSet<V> {
    fn from(range: Range<V>) -> Self {
        Self::Range(range)
    }
}

impl<V: Version> Display for VersionSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("(no versions)"),
            Self::Range(range) => range.fmt(f),
            Self::Union(ranges) => {
                let parts: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
                f.write_str(&parts.join(" OR "))
            }
        }
    }
}

// TESTS #######################################################################

#[cfg(test)]
pub mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::version::NumberVersion;

    pub fn strategy() -> impl Strategy<Value = VersionSet<NumberVersion>> {
        prop::collection::vec(any::<(u32, u32)>(), 0..5).prop_map(|pairs| {
            VersionSet::union_of(pairs.into_iter().map(|(a, b)| {
                let (low, high) = if a <= b { (a, b) } else { (b, a) };
                if low == high {
                    VersionSet::exact(NumberVersion(low))
                } else {
                    VersionSet::Range(Range::between(NumberVersion(low), NumberVersion(high)))
                }
            }))
        })
    }

    fn version_strat() -> impl Strategy<Value = NumberVersion> {
        any::<u32>().prop_map(NumberVersion)
    }

    proptest! {

        // Testing invert ----------------------------------

        #[test]
        fn invert_is_complement(set in strategy(), version in version_strat()) {
            assert_ne!(set.invert().includes(&version), set.includes(&version));
        }

        #[test]
        fn invert_invert_is_identity(set in strategy()) {
            assert_eq!(set.invert().invert(), set);
        }

        #[test]
        fn empty_invert_is_any(version in version_strat()) {
            assert!(VersionSet::<NumberVersion>::empty().invert().includes(&version));
        }

        // Testing intersect and union ---------------------

        #[test]
        fn intersect_is_in_both(s1 in strategy(), s2 in strategy(), version in version_strat()) {
            assert_eq!(
                s1.includes(&version) && s2.includes(&version),
                s1.intersect(&s2).includes(&version)
            );
        }

        #[test]
        fn union_is_in_either(s1 in strategy(), s2 in strategy(), version in version_strat()) {
            assert_eq!(
                s1.includes(&version) || s2.includes(&version),
                s1.union(&s2).includes(&version)
            );
        }

        #[test]
        fn intersect_is_commutative(s1 in strategy(), s2 in strategy()) {
            assert_eq!(s1.intersect(&s2), s2.intersect(&s1));
        }

        #[test]
        fn union_is_commutative(s1 in strategy(), s2 in strategy()) {
            assert_eq!(s1.union(&s2), s2.union(&s1));
        }

        #[test]
        fn intersect_with_any_is_identity(set in strategy()) {
            assert_eq!(set.intersect(&VersionSet::any()), set);
        }

        #[test]
        fn intersect_with_empty_is_empty(set in strategy()) {
            assert_eq!(set.intersect(&VersionSet::empty()), VersionSet::Empty);
        }

        // Testing allows_all ------------------------------

        #[test]
        fn allows_all_union_is_identity(s1 in strategy(), s2 in strategy()) {
            if s1.allows_all(&s2) {
                assert_eq!(s1.union(&s2), s1);
            }
        }

        #[test]
        fn allows_all_of_intersection(s1 in strategy(), s2 in strategy()) {
            assert!(s1.allows_all(&s1.intersect(&s2)));
        }

        // Testing upper_invert ----------------------------

        #[test]
        fn upper_invert_is_above(set in strategy(), version in version_strat()) {
            if set.upper_invert().includes(&version) {
                assert!(!set.includes(&version));
                for range in set.ranges() {
                    assert_eq!(range.compare_version(&version), Ordering::Greater);
                }
            }
        }
    }

    fn v(n: u32) -> NumberVersion {
        NumberVersion(n)
    }

    #[test]
    fn union_merges_contiguous_ranges() {
        let set = VersionSet::Range(Range::between(v(1), v(2)))
            .union(&VersionSet::Range(Range::between(v(2), v(3))));
        assert_eq!(set, VersionSet::Range(Range::between(v(1), v(3))));
    }

    #[test]
    fn union_keeps_gaps() {
        let set = VersionSet::exact(v(1)).union(&VersionSet::exact(v(3)));
        assert!(matches!(&set, VersionSet::Union(ranges) if ranges.len() == 2));
        assert!(set.includes(&v(1)));
        assert!(!set.includes(&v(2)));
        assert!(set.includes(&v(3)));
    }

    #[test]
    fn invert_of_between_is_two_ranges() {
        let set = Range::between(v(2), v(5)).invert();
        assert!(set.includes(&v(1)));
        assert!(!set.includes(&v(2)));
        assert!(!set.includes(&v(4)));
        assert!(set.includes(&v(5)));
    }

    #[test]
    fn display() {
        assert_eq!(VersionSet::<NumberVersion>::any().to_string(), "any");
        assert_eq!(VersionSet::<NumberVersion>::empty().to_string(), "(no versions)");
        assert_eq!(VersionSet::exact(v(3)).to_string(), "3");
        assert_eq!(
            VersionSet::Range(Range::between(v(1), v(4))).to_string(),
            ">= 1, < 4"
        );
        assert_eq!(
            VersionSet::exact(v(1)).union(&VersionSet::Range(Range::at_least(v(3)))).to_string(),
            "1 OR >= 3"
        );
    }
}
