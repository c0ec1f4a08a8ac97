//! Persistence gateway for slot timelines.
//!
//! The insert algorithm never talks to storage directly: it consumes a
//! pre-fetched impacted list and produces a [`SlotDiff`]. A [`SlotStore`]
//! implementation supplies both halves. Delete entries carry the fingerprint
//! the planner saw, so a store can detect that the impacted list went stale
//! between fetch and apply.

mod memory;

pub use memory::InMemorySlotStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::range::TimeRange;
use crate::types::slot::{PartitionKey, Slot, SlotId, SlotPayload};

/// Storage failure.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The slots a diff was planned against no longer match the store.
    #[error("stale slot state: {0}")]
    Conflict(String),
    /// The backend itself failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Which boundary-adjacent neighbors `find_impacted` should include next to
/// the overlapping slots.
///
/// A neighbor touching the query range at a boundary never overlaps it, but
/// the planner needs it as a coalescing candidate unless the association
/// forbids merging on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Include the slot ending exactly at the query range's lower boundary.
    pub left_merge: bool,
    /// Include the slot starting exactly at the query range's upper boundary.
    pub right_merge: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            left_merge: true,
            right_merge: true,
        }
    }
}

/// Reference to a slot scheduled for deletion, pinned to the state the
/// planner observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRef {
    /// The slot to delete.
    pub id: SlotId,
    /// Fingerprint of the slot as the planner saw it.
    pub fingerprint: u64,
}

impl DeleteRef {
    /// Reference `slot` for deletion.
    pub fn of<P: SlotPayload>(slot: &Slot<P>) -> Self {
        Self {
            id: slot.id(),
            fingerprint: slot.fingerprint(),
        }
    }
}

/// The net effect of one insert: slots to delete and slots to write, applied
/// atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDiff<P> {
    /// Existing slots to remove, with the state the planner observed.
    pub delete: Vec<DeleteRef>,
    /// New slots to write.
    pub upsert: Vec<Slot<P>>,
}

impl<P: SlotPayload> SlotDiff<P> {
    /// A diff that changes nothing.
    pub fn empty() -> Self {
        Self {
            delete: Vec::new(),
            upsert: Vec::new(),
        }
    }

    /// True when applying the diff would change nothing.
    pub fn is_noop(&self) -> bool {
        self.delete.is_empty() && self.upsert.is_empty()
    }
}

impl<P: SlotPayload> Default for SlotDiff<P> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Gateway to the persisted slot timeline of one or more partitions.
#[async_trait]
pub trait SlotStore<P: SlotPayload>: Send + Sync {
    /// Fetch the slots of `partition` impacted by an association over
    /// `range`: every slot overlapping it, plus the boundary-adjacent
    /// neighbor on each side `options` allows. Sorted ascending by range.
    async fn find_impacted(
        &self,
        partition: PartitionKey,
        range: &TimeRange,
        options: FetchOptions,
    ) -> Result<Vec<Slot<P>>, StoreError>;

    /// Apply a diff atomically.
    ///
    /// Every delete entry must match a stored slot by id and fingerprint;
    /// otherwise the impacted list the diff was planned against has gone
    /// stale and the whole diff is rejected with [`StoreError::Conflict`].
    async fn apply_diff(&self, partition: PartitionKey, diff: SlotDiff<P>)
        -> Result<(), StoreError>;
}
