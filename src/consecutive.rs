//! Ascending slot accumulator with automatic coalescing.
//!
//! The insert sweep produces many small per-overlap results; pushing them
//! through [`ConsecutiveSlots`] collapses adjacent, content-equal neighbors
//! into the minimal canonical sequence before the persistence diff sees them.

use tracing::trace;

use crate::day::DayResolver;
use crate::types::range::Range;
use crate::types::slot::{Slot, SlotPayload};

/// Accumulator for slots arriving in strictly ascending, non-overlapping
/// order.
///
/// `push` coalesces a new slot into the previous one when they are adjacent
/// and content-equal, and drops empty-payload slots entirely.
///
/// The caller guarantees monotonic, non-overlapping insertion order; this is
/// asserted in debug builds and undefined in release builds.
pub struct ConsecutiveSlots<'a, P> {
    days: &'a dyn DayResolver,
    slots: Vec<Slot<P>>,
}

impl<'a, P: SlotPayload> ConsecutiveSlots<'a, P> {
    /// Empty accumulator. The resolver recomputes day ranges when coalescing
    /// widens a slot.
    pub fn new(days: &'a dyn DayResolver) -> Self {
        Self {
            days,
            slots: Vec::new(),
        }
    }

    /// Append a slot, coalescing with the previous one when adjacent and
    /// content-equal. Empty-payload slots are skipped.
    pub fn push(&mut self, slot: Slot<P>) {
        if slot.is_empty_payload() {
            trace!(range = %slot.range(), "skip empty-payload slot");
            return;
        }
        debug_assert!(!slot.range().is_empty(), "push with an empty range");
        if let Some(last) = self.slots.last() {
            debug_assert!(
                last.range().strictly_left_of(slot.range()),
                "slots must be pushed in ascending, non-overlapping order"
            );
            debug_assert_eq!(
                last.partition(),
                slot.partition(),
                "all slots in a sequence belong to one partition"
            );
            if last.range().is_adjacent_to(slot.range()) && last.content_equals(&slot) {
                let merged_range = last.range().union(slot.range());
                trace!(range = %merged_range, "coalesce adjacent content-equal slots");
                let merged = last.clone_with_range(merged_range, self.days);
                *self.slots.last_mut().expect("non-empty") = merged;
                return;
            }
        }
        self.slots.push(slot);
    }

    /// Number of accumulated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The most recently accumulated slot.
    pub fn last(&self) -> Option<&Slot<P>> {
        self.slots.last()
    }

    /// The accumulated canonical sequence.
    pub fn into_vec(self) -> Vec<Slot<P>> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::CutoffDayResolver;
    use crate::types::range::TimeRange;
    use crate::types::slot::PartitionKey;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Serialize;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Tag(&'static str);

    impl SlotPayload for Tag {
        fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn slot(days: &CutoffDayResolver, lower: u32, upper: u32, tag: &'static str) -> Slot<Tag> {
        Slot::new(
            PartitionKey::new(1),
            TimeRange::new(Some(at(lower)), Some(at(upper))),
            Tag(tag),
            days,
        )
    }

    #[test]
    fn adjacent_equal_content_coalesces() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 1, 5, "A"));
        acc.push(slot(&days, 5, 9, "A"));

        let out = acc.into_vec();
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].range(), TimeRange::new(Some(at(1)), Some(at(9))));
        assert_eq!(out[0].payload(), &Tag("A"));
    }

    #[test]
    fn adjacent_different_content_stays_separate() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 1, 5, "A"));
        acc.push(slot(&days, 5, 9, "B"));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn gap_prevents_coalescing() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 1, 5, "A"));
        acc.push(slot(&days, 7, 9, "A"));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn empty_payload_is_dropped() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 1, 5, ""));
        assert!(acc.is_empty());
    }

    #[test]
    fn long_run_collapses_to_one() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        for d in 1..10 {
            acc.push(slot(&days, d, d + 1, "A"));
        }
        let out = acc.into_vec();
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].range(), TimeRange::new(Some(at(1)), Some(at(10))));
    }

    #[test]
    fn unbounded_tail_coalesces() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 1, 5, "A"));
        acc.push(Slot::new(
            PartitionKey::new(1),
            TimeRange::new(Some(at(5)), None),
            Tag("A"),
            &days,
        ));
        let out = acc.into_vec();
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].range(), TimeRange::new(Some(at(1)), None));
    }

    #[test]
    #[should_panic(expected = "ascending")]
    fn out_of_order_push_panics_in_debug() {
        let days = CutoffDayResolver::midnight();
        let mut acc = ConsecutiveSlots::new(&days);
        acc.push(slot(&days, 5, 9, "A"));
        acc.push(slot(&days, 1, 5, "B"));
    }
}
