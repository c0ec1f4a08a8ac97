//! Production-day boundary resolution.
//!
//! Persisted slots carry, next to their date/time range, a coarser calendar
//! projection: the range of production days they touch. A production day
//! rarely starts at midnight — plants configure a cut-off such as 05:00 or
//! 21:30 — so the projection is delegated to a [`DayResolver`] and recomputed
//! whenever a slot range changes.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::bound::Bound;
use crate::types::range::{Range, TimeRange};

/// The production days covered by a date/time range. Closed on both ends.
pub type DayRange = Range<NaiveDate>;

/// Maps a date/time range to the production days it touches.
pub trait DayResolver: Send + Sync {
    /// The production day containing `at`.
    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate;

    /// The closed day range covered by `range`.
    ///
    /// An unbounded endpoint stays unbounded. An empty input yields an empty
    /// day range.
    fn day_range(&self, range: &TimeRange) -> DayRange {
        if range.is_empty() {
            // A degenerate closed range; callers never persist it.
            let day = range
                .lower()
                .value()
                .map(|t| self.day_of(t))
                .unwrap_or_default();
            return Range::from_bounds(Bound::inclusive(day), Bound::exclusive(day));
        }
        let lower = match range.lower().value() {
            None => Bound::Unbounded,
            Some(t) => Bound::inclusive(self.day_of(t)),
        };
        let upper = match range.upper() {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Value {
                at,
                inclusive: true,
            } => Bound::inclusive(self.day_of(*at)),
            // An exclusive upper bound covers nothing at the instant itself,
            // so the last covered day is that of the instant just before it.
            // A range ending exactly at the cut-off must not include the day
            // that starts there.
            Bound::Value {
                at,
                inclusive: false,
            } => Bound::inclusive(self.day_of(*at - Duration::nanoseconds(1))),
        };
        Range::from_bounds(lower, upper)
    }
}

/// Day resolver with a fixed cut-off offset from midnight UTC.
///
/// An instant before the cut-off belongs to the previous production day, so
/// with a 05:00 cut-off, 2024-01-10 03:00 UTC falls on production day
/// 2024-01-09.
#[derive(Debug, Clone)]
pub struct CutoffDayResolver {
    cutoff: Duration,
}

impl CutoffDayResolver {
    /// Resolver with the given cut-off offset from midnight UTC.
    pub fn new(cutoff: Duration) -> Self {
        Self { cutoff }
    }

    /// Resolver with days starting at midnight UTC.
    pub fn midnight() -> Self {
        Self {
            cutoff: Duration::zero(),
        }
    }
}

impl DayResolver for CutoffDayResolver {
    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        (at - self.cutoff).date_naive()
    }
}
