//! In-memory slot store for tests and embedded use.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{FetchOptions, SlotDiff, SlotStore, StoreError};
use crate::types::range::TimeRange;
use crate::types::slot::{PartitionKey, Slot, SlotPayload};

/// In-memory slot store.
///
/// Each partition's slots are kept sorted ascending by range, which is an
/// invariant of the timeline anyway since slots never overlap. Diffs apply
/// under a single write lock, so concurrent readers either see the full
/// pre-diff or full post-diff state.
#[derive(Debug, Default)]
pub struct InMemorySlotStore<P> {
    partitions: RwLock<BTreeMap<PartitionKey, Vec<Slot<P>>>>,
}

impl<P: SlotPayload> InMemorySlotStore<P> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seed a slot directly, bypassing the insert algorithm. Test setup only;
    /// the caller is responsible for keeping the timeline non-overlapping.
    pub fn seed(&self, slot: Slot<P>) {
        let mut partitions = self.partitions.write();
        let slots = partitions.entry(slot.partition()).or_default();
        slots.push(slot);
        slots.sort_by(|a, b| a.range().cmp(b.range()));
    }

    /// Snapshot of a partition's slots, sorted ascending.
    pub fn slots(&self, partition: PartitionKey) -> Vec<Slot<P>> {
        self.partitions
            .read()
            .get(&partition)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of slots stored for a partition.
    pub fn len(&self, partition: PartitionKey) -> usize {
        self.partitions
            .read()
            .get(&partition)
            .map_or(0, Vec::len)
    }

    /// True when the partition holds no slots.
    pub fn is_empty(&self, partition: PartitionKey) -> bool {
        self.len(partition) == 0
    }
}

#[async_trait]
impl<P: SlotPayload> SlotStore<P> for InMemorySlotStore<P> {
    async fn find_impacted(
        &self,
        partition: PartitionKey,
        range: &TimeRange,
        options: FetchOptions,
    ) -> Result<Vec<Slot<P>>, StoreError> {
        let partitions = self.partitions.read();
        let Some(slots) = partitions.get(&partition) else {
            return Ok(Vec::new());
        };
        let impacted = slots
            .iter()
            .filter(|slot| {
                if slot.range().overlaps(range) {
                    return true;
                }
                if !slot.range().is_adjacent_to(range) {
                    return false;
                }
                if slot.range().strictly_left_of(range) {
                    options.left_merge
                } else {
                    options.right_merge
                }
            })
            .cloned()
            .collect();
        Ok(impacted)
    }

    async fn apply_diff(
        &self,
        partition: PartitionKey,
        diff: SlotDiff<P>,
    ) -> Result<(), StoreError> {
        if diff.is_noop() {
            return Ok(());
        }
        let mut partitions = self.partitions.write();
        let slots = partitions.entry(partition).or_default();

        // Validate every delete before touching anything.
        for delete in &diff.delete {
            match slots.iter().find(|slot| slot.id() == delete.id) {
                None => {
                    return Err(StoreError::Conflict(format!(
                        "slot {} no longer exists",
                        delete.id
                    )))
                }
                Some(slot) if slot.fingerprint() != delete.fingerprint => {
                    return Err(StoreError::Conflict(format!(
                        "slot {} changed since it was fetched",
                        delete.id
                    )))
                }
                Some(_) => {}
            }
        }

        slots.retain(|slot| !diff.delete.iter().any(|d| d.id == slot.id()));
        slots.extend(diff.upsert);
        slots.sort_by(|a, b| a.range().cmp(b.range()));
        Ok(())
    }
}
