//! Slots: one payload value over a contiguous time range within a partition.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::day::{DayRange, DayResolver};
use crate::fingerprint::fingerprint;
use crate::types::range::TimeRange;

/// Unique identifier for a persisted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(Uuid);

impl SlotId {
    /// Create a SlotId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random SlotId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The grouping key within which slot invariants are enforced: one machine,
/// line, or other resource whose timeline is independent of all others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey(i64);

impl PartitionKey {
    /// Create a partition key from its raw id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition:{}", self.0)
    }
}

/// Contract for the reference data a slot carries.
///
/// Content equality (`PartialEq`) decides coalescing and no-op detection; it
/// must compare reference data only. `Serialize` feeds the canonical
/// fingerprint.
pub trait SlotPayload: Clone + PartialEq + fmt::Debug + Serialize + Send + Sync {
    /// True when the payload represents "nothing assigned". Such slots are
    /// never materialized; the timeline keeps a gap instead.
    fn is_empty(&self) -> bool {
        false
    }
}

/// A persisted record holding one payload value over a contiguous time range
/// within a partition.
///
/// Slots are never mutated in place: a range update goes through
/// [`Slot::clone_with_range`], which also recomputes the derived production
/// day projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<P> {
    id: SlotId,
    partition: PartitionKey,
    range: TimeRange,
    day_range: DayRange,
    payload: P,
}

impl<P: SlotPayload> Slot<P> {
    /// Create a new slot with a fresh id. The day range is derived from the
    /// date/time range through the resolver.
    pub fn new(
        partition: PartitionKey,
        range: TimeRange,
        payload: P,
        days: &dyn DayResolver,
    ) -> Self {
        let day_range = days.day_range(&range);
        Self {
            id: SlotId::generate(),
            partition,
            range,
            day_range,
            payload,
        }
    }

    /// Rebuild a slot from persisted fields.
    pub fn from_parts(
        id: SlotId,
        partition: PartitionKey,
        range: TimeRange,
        day_range: DayRange,
        payload: P,
    ) -> Self {
        Self {
            id,
            partition,
            range,
            day_range,
            payload,
        }
    }

    /// Slot id.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Owning partition.
    pub fn partition(&self) -> PartitionKey {
        self.partition
    }

    /// Date/time range.
    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    /// Derived production day range.
    pub fn day_range(&self) -> &DayRange {
        &self.day_range
    }

    /// Payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// A new slot (fresh id) with the same payload over a different range.
    /// The day range is recomputed from the new date/time range.
    pub fn clone_with_range(&self, range: TimeRange, days: &dyn DayResolver) -> Self {
        debug_assert!(!range.is_empty(), "clone_with_range with an empty range");
        let day_range = days.day_range(&range);
        Self {
            id: SlotId::generate(),
            partition: self.partition,
            range,
            day_range,
            payload: self.payload.clone(),
        }
    }

    /// Compare reference data only, ignoring ranges and ids. This is the
    /// predicate behind coalescing and no-op detection.
    pub fn content_equals(&self, other: &Self) -> bool {
        self.payload == other.payload
    }

    /// True when the payload represents "nothing assigned".
    pub fn is_empty_payload(&self) -> bool {
        self.payload.is_empty()
    }

    /// Canonical fingerprint of the observable state (partition, range,
    /// payload), independent of the slot id.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&(&self.partition, &self.range, &self.payload))
    }
}
