//! Intervals over an ordered instant type.
//!
//! [`Range`] mirrors the PostgreSQL range operators the persisted timeline
//! relies on: overlap (`&&`), adjacency (`-|-`), strictly-left (`<<`),
//! containment (`@>`), intersection (`*`) and union (`+`). The canonical form
//! for persisted slots is half-open `[lower, upper)`, but every predicate
//! honors inclusivity so non-canonical ranges behave correctly too.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::bound::{Bound, Side};

/// An interval between two [`Bound`]s.
///
/// A range is empty when its upper endpoint sits before its lower endpoint,
/// or when both endpoints share an instant and at least one side is open.
/// Every operation detects emptiness before doing anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range<T> {
    lower: Bound<T>,
    upper: Bound<T>,
}

/// A UTC date/time range, the domain of slot timelines.
pub type TimeRange = Range<chrono::DateTime<chrono::Utc>>;

impl<T: Copy + Ord> Range<T> {
    /// Canonical half-open range `[lower, upper)`; `None` means unbounded.
    pub fn new(lower: Option<T>, upper: Option<T>) -> Self {
        Self {
            lower: lower.map_or(Bound::Unbounded, Bound::inclusive),
            upper: upper.map_or(Bound::Unbounded, Bound::exclusive),
        }
    }

    /// Range from explicit endpoints.
    pub fn from_bounds(lower: Bound<T>, upper: Bound<T>) -> Self {
        Self { lower, upper }
    }

    /// The full domain `(-oo, +oo)`.
    pub fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Closed range `[lower, upper]`.
    pub fn closed(lower: T, upper: T) -> Self {
        Self {
            lower: Bound::inclusive(lower),
            upper: Bound::inclusive(upper),
        }
    }

    /// Lower endpoint.
    pub fn lower(&self) -> &Bound<T> {
        &self.lower
    }

    /// Upper endpoint.
    pub fn upper(&self) -> &Bound<T> {
        &self.upper
    }

    /// True when the range covers no instant.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (
                Bound::Value {
                    at: l,
                    inclusive: li,
                },
                Bound::Value {
                    at: u,
                    inclusive: ui,
                },
            ) => u < l || (l == u && !(*li && *ui)),
            _ => false,
        }
    }

    /// True for a single-instant closed range `[x, x]`.
    pub fn is_point(&self) -> bool {
        matches!(
            (&self.lower, &self.upper),
            (
                Bound::Value { at: l, inclusive: true },
                Bound::Value { at: u, inclusive: true },
            ) if l == u
        )
    }

    /// Does a lower endpoint start before an upper endpoint closes, covering
    /// at least one instant between them?
    fn begins_before_end(lower: &Bound<T>, upper: &Bound<T>) -> bool {
        match (lower, upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
            (
                Bound::Value {
                    at: l,
                    inclusive: li,
                },
                Bound::Value {
                    at: u,
                    inclusive: ui,
                },
            ) => l < u || (l == u && *li && *ui),
        }
    }

    /// Overlap operator: the two ranges share at least one instant.
    ///
    /// A shared boundary instant counts only when both sides include it.
    /// False when either range is empty.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        Self::begins_before_end(&self.lower, &other.upper)
            && Self::begins_before_end(&other.lower, &self.upper)
    }

    /// Strictly-left operator: every instant of `self` precedes every instant
    /// of `other`. False when either range is empty.
    pub fn strictly_left_of(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        match (&self.upper, &other.lower) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (
                Bound::Value {
                    at: u,
                    inclusive: ui,
                },
                Bound::Value {
                    at: l,
                    inclusive: li,
                },
            ) => u < l || (u == l && !(*ui && *li)),
        }
    }

    /// Adjacency operator: the ranges meet at a shared instant with
    /// complementary inclusivity, leaving no gap and no overlap.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let meets = |upper: &Bound<T>, lower: &Bound<T>| match (upper, lower) {
            (
                Bound::Value {
                    at: u,
                    inclusive: ui,
                },
                Bound::Value {
                    at: l,
                    inclusive: li,
                },
            ) => u == l && (*ui ^ *li),
            _ => false,
        };
        meets(&self.upper, &other.lower) || meets(&other.upper, &self.lower)
    }

    /// Containment operator: `self` covers every instant of `other`.
    /// An empty `other` is contained in any non-empty range.
    pub fn contains_range(&self, other: &Self) -> bool {
        if self.is_empty() {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        let lower_covers = match (&self.lower, &other.lower) {
            (Bound::Unbounded, _) => true,
            (_, Bound::Unbounded) => false,
            (
                Bound::Value {
                    at: a,
                    inclusive: ai,
                },
                Bound::Value {
                    at: b,
                    inclusive: bi,
                },
            ) => a < b || (a == b && (*ai || !*bi)),
        };
        let upper_covers = match (&self.upper, &other.upper) {
            (Bound::Unbounded, _) => true,
            (_, Bound::Unbounded) => false,
            (
                Bound::Value {
                    at: a,
                    inclusive: ai,
                },
                Bound::Value {
                    at: b,
                    inclusive: bi,
                },
            ) => b < a || (a == b && (*ai || !*bi)),
        };
        lower_covers && upper_covers
    }

    /// True when the range covers the instant `at`.
    pub fn contains(&self, at: T) -> bool {
        self.contains_range(&Self::closed(at, at))
    }

    /// Intersection operator. `None` when the ranges do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self {
            lower: Bound::max_lower(&self.lower, &other.lower),
            upper: Bound::min_upper(&self.upper, &other.upper),
        })
    }

    /// Union operator, defined only for overlapping or adjacent ranges.
    ///
    /// # Panics
    ///
    /// Panics when the ranges are disjoint and not adjacent; the result would
    /// not be contiguous, which is a programming error in the caller.
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        assert!(
            self.overlaps(other) || self.is_adjacent_to(other),
            "union of disjoint, non-adjacent ranges"
        );
        Self {
            lower: Bound::min_lower(&self.lower, &other.lower),
            upper: Bound::max_upper(&self.upper, &other.upper),
        }
    }
}

impl<T: Copy + Ord> PartialOrd for Range<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Copy + Ord> Ord for Range<T> {
    /// Lower endpoint first, then upper.
    fn cmp(&self, other: &Self) -> Ordering {
        Bound::compare(&self.lower, Side::Lower, &other.lower, Side::Lower)
            .then_with(|| Bound::compare(&self.upper, Side::Upper, &other.upper, Side::Upper))
    }
}

impl<T: Copy + Ord + fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "empty");
        }
        write!(f, "{}", if self.lower.is_inclusive() { "[" } else { "(" })?;
        self.lower.display_value(f, Side::Lower)?;
        write!(f, ",")?;
        self.upper.display_value(f, Side::Upper)?;
        write!(f, "{}", if self.upper.is_inclusive() { "]" } else { ")" })
    }
}
