//! Interval endpoints.
//!
//! A [`Bound`] is one endpoint of a possibly-unbounded interval. Whether an
//! unbounded endpoint means -oo or +oo depends on which side of the interval it
//! sits on, so comparisons take an explicit [`Side`] for each operand.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which side of an interval an endpoint belongs to.
///
/// `Unbounded` as a lower endpoint sorts below every value; as an upper
/// endpoint it sorts above every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Lower endpoint; unbounded means -oo.
    Lower,
    /// Upper endpoint; unbounded means +oo.
    Upper,
}

/// One endpoint of an interval: a concrete instant with inclusivity, or
/// unbounded.
///
/// Equality requires both the instant and the inclusivity to match. Positional
/// comparison ([`Bound::compare`]) ignores inclusivity; range predicates that
/// care about open/closed boundaries handle it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound<T> {
    /// No endpoint; -oo or +oo depending on the side.
    Unbounded,
    /// A concrete endpoint.
    Value {
        /// The instant.
        at: T,
        /// Whether the instant itself belongs to the interval.
        inclusive: bool,
    },
}

impl<T: Copy + Ord> Bound<T> {
    /// Closed endpoint at `at`.
    pub fn inclusive(at: T) -> Self {
        Self::Value {
            at,
            inclusive: true,
        }
    }

    /// Open endpoint at `at`.
    pub fn exclusive(at: T) -> Self {
        Self::Value {
            at,
            inclusive: false,
        }
    }

    /// The concrete instant, if any.
    pub fn value(&self) -> Option<T> {
        match self {
            Self::Unbounded => None,
            Self::Value { at, .. } => Some(*at),
        }
    }

    /// True for -oo/+oo.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// True when the endpoint instant belongs to the interval.
    /// Unbounded endpoints report false.
    pub fn is_inclusive(&self) -> bool {
        matches!(
            self,
            Self::Value {
                inclusive: true,
                ..
            }
        )
    }

    /// Same instant with flipped inclusivity.
    ///
    /// A bound and its complement meet at the boundary with no gap and no
    /// overlap, which is how a slot end turns into the start of the next
    /// uncovered region and vice versa. Unbounded is its own complement.
    pub fn complement(&self) -> Self {
        match *self {
            Self::Unbounded => Self::Unbounded,
            Self::Value { at, inclusive } => Self::Value {
                at,
                inclusive: !inclusive,
            },
        }
    }

    /// Total order over endpoint positions.
    ///
    /// `Unbounded` as a lower endpoint sorts below every value and below
    /// `Unbounded` as an upper endpoint. Inclusivity is ignored: two bounds at
    /// the same instant compare equal regardless of open/closed.
    pub fn compare(a: &Self, a_side: Side, b: &Self, b_side: Side) -> Ordering {
        match (a, b) {
            (Self::Unbounded, Self::Unbounded) => match (a_side, b_side) {
                (Side::Lower, Side::Upper) => Ordering::Less,
                (Side::Upper, Side::Lower) => Ordering::Greater,
                _ => Ordering::Equal,
            },
            (Self::Unbounded, Self::Value { .. }) => match a_side {
                Side::Lower => Ordering::Less,
                Side::Upper => Ordering::Greater,
            },
            (Self::Value { .. }, Self::Unbounded) => match b_side {
                Side::Lower => Ordering::Greater,
                Side::Upper => Ordering::Less,
            },
            (Self::Value { at: x, .. }, Self::Value { at: y, .. }) => x.cmp(y),
        }
    }

    /// The later of two lower endpoints, keeping the stricter inclusivity on a
    /// tie (an intersection keeps a boundary instant only when both sides do).
    pub fn max_lower(a: &Self, b: &Self) -> Self {
        match Self::compare(a, Side::Lower, b, Side::Lower) {
            Ordering::Less => *b,
            Ordering::Greater => *a,
            Ordering::Equal => match (a, b) {
                (
                    Self::Value { at, inclusive: ai },
                    Self::Value { inclusive: bi, .. },
                ) => Self::Value {
                    at: *at,
                    inclusive: *ai && *bi,
                },
                _ => *a,
            },
        }
    }

    /// The earlier of two upper endpoints, keeping the stricter inclusivity on
    /// a tie.
    pub fn min_upper(a: &Self, b: &Self) -> Self {
        match Self::compare(a, Side::Upper, b, Side::Upper) {
            Ordering::Less => *a,
            Ordering::Greater => *b,
            Ordering::Equal => match (a, b) {
                (
                    Self::Value { at, inclusive: ai },
                    Self::Value { inclusive: bi, .. },
                ) => Self::Value {
                    at: *at,
                    inclusive: *ai && *bi,
                },
                _ => *a,
            },
        }
    }

    /// The earlier of two lower endpoints, keeping the wider inclusivity on a
    /// tie (a union keeps a boundary instant when either side does).
    pub fn min_lower(a: &Self, b: &Self) -> Self {
        match Self::compare(a, Side::Lower, b, Side::Lower) {
            Ordering::Less => *a,
            Ordering::Greater => *b,
            Ordering::Equal => match (a, b) {
                (
                    Self::Value { at, inclusive: ai },
                    Self::Value { inclusive: bi, .. },
                ) => Self::Value {
                    at: *at,
                    inclusive: *ai || *bi,
                },
                _ => *a,
            },
        }
    }

    /// The later of two upper endpoints, keeping the wider inclusivity on a
    /// tie.
    pub fn max_upper(a: &Self, b: &Self) -> Self {
        match Self::compare(a, Side::Upper, b, Side::Upper) {
            Ordering::Less => *b,
            Ordering::Greater => *a,
            Ordering::Equal => match (a, b) {
                (
                    Self::Value { at, inclusive: ai },
                    Self::Value { inclusive: bi, .. },
                ) => Self::Value {
                    at: *at,
                    inclusive: *ai || *bi,
                },
                _ => *a,
            },
        }
    }
}

impl<T: fmt::Display> Bound<T> {
    /// Render for range notation, without brackets.
    pub(crate) fn display_value(&self, f: &mut fmt::Formatter<'_>, side: Side) -> fmt::Result {
        match self {
            Self::Unbounded => match side {
                Side::Lower => write!(f, "-oo"),
                Side::Upper => write!(f, "+oo"),
            },
            Self::Value { at, .. } => write!(f, "{at}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_polarity() {
        let v: Bound<i32> = Bound::inclusive(5);
        assert_eq!(
            Bound::compare(&Bound::Unbounded, Side::Lower, &v, Side::Lower),
            Ordering::Less
        );
        assert_eq!(
            Bound::compare(&Bound::Unbounded, Side::Upper, &v, Side::Upper),
            Ordering::Greater
        );
        assert_eq!(
            Bound::compare(
                &Bound::<i32>::Unbounded,
                Side::Lower,
                &Bound::Unbounded,
                Side::Upper
            ),
            Ordering::Less
        );
        assert_eq!(
            Bound::compare(
                &Bound::<i32>::Unbounded,
                Side::Lower,
                &Bound::Unbounded,
                Side::Lower
            ),
            Ordering::Equal
        );
    }

    #[test]
    fn positional_compare_ignores_inclusivity() {
        let a: Bound<i32> = Bound::inclusive(3);
        let b: Bound<i32> = Bound::exclusive(3);
        assert_eq!(Bound::compare(&a, Side::Lower, &b, Side::Lower), Ordering::Equal);
        assert_ne!(a, b);
    }

    #[test]
    fn complement_flips_inclusivity() {
        let a: Bound<i32> = Bound::exclusive(7);
        assert_eq!(a.complement(), Bound::inclusive(7));
        assert_eq!(Bound::<i32>::Unbounded.complement(), Bound::Unbounded);
    }

    #[test]
    fn tie_breaking_keeps_strictness() {
        let closed: Bound<i32> = Bound::inclusive(4);
        let open: Bound<i32> = Bound::exclusive(4);
        assert_eq!(Bound::max_lower(&closed, &open), open);
        assert_eq!(Bound::min_upper(&closed, &open), open);
        assert_eq!(Bound::min_lower(&closed, &open), closed);
        assert_eq!(Bound::max_upper(&closed, &open), closed);
    }

    #[test]
    fn unbounded_wins_union_loses_intersection() {
        let v: Bound<i32> = Bound::inclusive(1);
        assert_eq!(Bound::min_lower(&Bound::Unbounded, &v), Bound::Unbounded);
        assert_eq!(Bound::max_upper(&Bound::Unbounded, &v), Bound::Unbounded);
        assert_eq!(Bound::max_lower(&Bound::Unbounded, &v), v);
        assert_eq!(Bound::min_upper(&Bound::Unbounded, &v), v);
    }
}
