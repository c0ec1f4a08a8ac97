//! The insert algorithm: reconciling an association with a partition's
//! existing slot sequence.
//!
//! [`plan_insert`] is the pure core. It takes the association, the pre-fetched
//! impacted slots, and the caller's merge function, and computes a minimal
//! [`SlotDiff`] that re-establishes the canonical timeline form: slots sorted,
//! non-overlapping, no adjacent pair with equal content, no empty payloads.
//! [`TimelineEngine`] wires the planner to a [`SlotStore`].

use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::consecutive::ConsecutiveSlots;
use crate::day::DayResolver;
use crate::guard::{CancellationGuard, Cancelled};
use crate::store::{DeleteRef, FetchOptions, SlotDiff, SlotStore, StoreError};
use crate::types::association::{Association, MergeError, MergeStrategy};
use crate::types::bound::{Bound, Side};
use crate::types::range::{Range, TimeRange};
use crate::types::slot::{PartitionKey, Slot, SlotPayload};

/// Failure of one insert. No partial diff is ever applied: whatever the
/// variant, the partition is exactly as it was before the call.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The caller-supplied merge function failed.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// The cancellation guard tripped mid-sweep. The caller may retry the
    /// full insert later.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// The pre-fetched impacted slots went stale before the diff applied.
    /// The caller must re-run the whole insert.
    #[error("impacted slots changed since fetch: {0}")]
    StorageConflict(String),
    /// The storage backend failed.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for InsertError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::StorageConflict(message),
            other => Self::Storage(other),
        }
    }
}

/// Compute the diff that merges `association` into a partition's timeline.
///
/// `candidates` is the pre-fetched impacted list, sorted ascending; a
/// superset is fine, the planner filters it down to slots that overlap the
/// association's range plus the boundary-adjacent neighbor on each side the
/// association's options allow. An empty association range is a successful
/// no-op.
///
/// The merge function is called exactly once per overlapping slot. The guard
/// is polled once per slot; a trip aborts with [`InsertError::Cancelled`] and
/// no diff.
pub fn plan_insert<P: SlotPayload>(
    partition: PartitionKey,
    association: &Association<P>,
    strategy: &dyn MergeStrategy<P>,
    candidates: &[Slot<P>],
    days: &dyn DayResolver,
    guard: &CancellationGuard,
) -> Result<SlotDiff<P>, InsertError> {
    let range = association.range();
    if range.is_empty() {
        trace!(%partition, "empty association range, nothing to do");
        return Ok(SlotDiff::empty());
    }
    debug_assert!(
        candidates.windows(2).all(|w| w[0].range() < w[1].range()),
        "candidates must be sorted ascending"
    );
    debug_assert!(
        candidates.iter().all(|s| s.partition() == partition),
        "candidates must belong to the target partition"
    );

    // Split the candidate superset into the true impacted set: overlapping
    // slots, plus at most one coalescing neighbor per allowed side.
    let options = association.options();
    let mut left_neighbor: Option<&Slot<P>> = None;
    let mut right_neighbor: Option<&Slot<P>> = None;
    let mut overlapping: Vec<&Slot<P>> = Vec::new();
    for slot in candidates {
        if slot.range().overlaps(range) {
            overlapping.push(slot);
        } else if slot.range().is_adjacent_to(range) {
            if slot.range().strictly_left_of(range) {
                if !options.no_left_merge {
                    left_neighbor = Some(slot);
                }
            } else if !options.no_right_merge {
                right_neighbor = Some(slot);
            }
        }
    }

    // One merge call per overlapping slot, guard polled per iteration.
    let mut merged: Vec<(&Slot<P>, TimeRange, Option<P>)> =
        Vec::with_capacity(overlapping.len());
    for slot in overlapping {
        guard.check()?;
        if let Some(overlap) = range.intersect(slot.range()) {
            let payload = strategy.merge(association, slot, &overlap)?;
            merged.push((slot, overlap, payload));
        }
    }

    // Fast path: one impacted slot covering exactly the association's range,
    // and the merge keeps its content. Nothing to delete, nothing to write.
    if let [(slot, _, payload)] = merged.as_slice() {
        if slot.range() == range
            && payload.as_ref().is_some_and(|p| p == slot.payload() && !p.is_empty())
        {
            trace!(%partition, range = %range, "merge is a content no-op");
            return Ok(SlotDiff::empty());
        }
    }

    // Sweep ascending. `cursor` is the lower bound of the first instant not
    // yet covered by the output; `None` once an unbounded slot covered the
    // rest of the domain.
    let synthesize = |gap: TimeRange| -> Option<Slot<P>> {
        association
            .payload()
            .map(|payload| Slot::new(partition, gap, payload.clone(), days))
    };
    let mut acc = ConsecutiveSlots::new(days);
    if let Some(neighbor) = left_neighbor {
        acc.push(neighbor.clone());
    }
    let mut cursor: Option<Bound<chrono::DateTime<chrono::Utc>>> = Some(*range.lower());
    for (slot, overlap, payload) in &merged {
        guard.check()?;

        // Remainder of the slot extending left of the association.
        if Bound::compare(slot.range().lower(), Side::Lower, range.lower(), Side::Lower)
            == Ordering::Less
        {
            let remainder =
                Range::from_bounds(*slot.range().lower(), range.lower().complement());
            acc.push(slot.clone_with_range(remainder, days));
        }

        // Gap the association covers but no existing slot did.
        if let Some(c) = &cursor {
            if Bound::compare(c, Side::Lower, slot.range().lower(), Side::Lower)
                == Ordering::Less
            {
                let gap = Range::from_bounds(*c, slot.range().lower().complement());
                if let Some(filler) = synthesize(gap) {
                    acc.push(filler);
                }
            }
        }

        // What holds over the overlap, per the merge function.
        if let Some(payload) = payload {
            acc.push(Slot::new(partition, *overlap, payload.clone(), days));
        }

        // Remainder of the slot extending right of the association.
        if Bound::compare(slot.range().upper(), Side::Upper, range.upper(), Side::Upper)
            == Ordering::Greater
        {
            let remainder =
                Range::from_bounds(range.upper().complement(), *slot.range().upper());
            acc.push(slot.clone_with_range(remainder, days));
        }

        cursor = match slot.range().upper() {
            Bound::Unbounded => None,
            upper => Some(upper.complement()),
        };
    }

    // Tail gap up to the association's upper bound.
    if let Some(c) = cursor {
        if Bound::compare(&c, Side::Lower, range.upper(), Side::Upper) == Ordering::Less {
            let gap = Range::from_bounds(c, *range.upper());
            if let Some(filler) = synthesize(gap) {
                acc.push(filler);
            }
        }
    }
    if let Some(neighbor) = right_neighbor {
        acc.push(neighbor.clone());
    }

    // Diff: impacted slots are the deletion set, the accumulator the upsert
    // set, minus pairs identical in range and content. Pruning is what keeps
    // untouched neighbors and no-op replacements out of the diff entirely.
    let mut deletes: Vec<&Slot<P>> = Vec::new();
    deletes.extend(left_neighbor);
    deletes.extend(merged.iter().map(|(slot, _, _)| *slot));
    deletes.extend(right_neighbor);
    let mut upserts = acc.into_vec();
    upserts.retain(|upsert| {
        if let Some(pos) = deletes
            .iter()
            .position(|d| d.range() == upsert.range() && d.content_equals(upsert))
        {
            deletes.remove(pos);
            false
        } else {
            true
        }
    });

    let diff = SlotDiff {
        delete: deletes.iter().map(|d| DeleteRef::of(*d)).collect(),
        upsert: upserts,
    };
    debug!(
        %partition,
        range = %range,
        delete = diff.delete.len(),
        upsert = diff.upsert.len(),
        "insert planned"
    );
    Ok(diff)
}

/// The planner wired to a [`SlotStore`]: fetches the impacted slots, plans,
/// and applies the diff atomically.
pub struct TimelineEngine<S> {
    store: Arc<S>,
    days: Arc<dyn DayResolver>,
}

impl<S> TimelineEngine<S> {
    /// Engine over `store`, deriving day ranges through `days`.
    pub fn new(store: Arc<S>, days: Arc<dyn DayResolver>) -> Self {
        Self { store, days }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Merge `association` into `partition`'s timeline and return the diff
    /// that was applied.
    ///
    /// Serialization of concurrent inserts on one partition is the store's
    /// responsibility; the engine itself holds no shared mutable state.
    pub async fn insert<P>(
        &self,
        partition: PartitionKey,
        association: &Association<P>,
        strategy: &dyn MergeStrategy<P>,
        guard: &CancellationGuard,
    ) -> Result<SlotDiff<P>, InsertError>
    where
        P: SlotPayload,
        S: SlotStore<P>,
    {
        if association.range().is_empty() {
            return Ok(SlotDiff::empty());
        }
        let options = association.options();
        let fetch = FetchOptions {
            left_merge: !options.no_left_merge,
            right_merge: !options.no_right_merge,
        };
        let candidates = self
            .store
            .find_impacted(partition, association.range(), fetch)
            .await?;
        self.insert_prefetched(partition, association, strategy, &candidates, guard)
            .await
    }

    /// Like [`TimelineEngine::insert`], with an impacted list the caller
    /// already fetched. A stale list surfaces as
    /// [`InsertError::StorageConflict`] when the diff is applied.
    pub async fn insert_prefetched<P>(
        &self,
        partition: PartitionKey,
        association: &Association<P>,
        strategy: &dyn MergeStrategy<P>,
        candidates: &[Slot<P>],
        guard: &CancellationGuard,
    ) -> Result<SlotDiff<P>, InsertError>
    where
        P: SlotPayload,
        S: SlotStore<P>,
    {
        let diff = plan_insert(
            partition,
            association,
            strategy,
            candidates,
            self.days.as_ref(),
            guard,
        )?;
        if !diff.is_noop() {
            self.store.apply_diff(partition, diff.clone()).await?;
        }
        Ok(diff)
    }
}
