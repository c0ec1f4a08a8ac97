//! # timeline-kernel
//!
//! Temporal slot timeline engine for manufacturing-execution data.
//!
//! The engine answers one question:
//!
//! > Given a new fact valid over a date/time range, what is the minimal change
//! > to a partition's existing slot sequence that reconciles it?
//!
//! ## Core Contract
//!
//! 1. A partition's slots are pairwise non-overlapping and sorted by range
//! 2. No two adjacent slots have equal content (canonical form)
//! 3. Slots with an empty payload are never persisted
//!
//! ## Architecture
//!
//! ```text
//! Association → plan_insert → SlotDiff → SlotStore (atomic apply)
//!                    ↓
//!          MergeStrategy + DayResolver + CancellationGuard
//! ```
//!
//! The planner is pure: it consumes a pre-fetched impacted list and produces a
//! delete/upsert diff, never touching storage itself. [`TimelineEngine`] wires
//! it to a [`SlotStore`]; the diff applies all-or-nothing per partition, and a
//! stale prefetch surfaces as a conflict the caller retries.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod consecutive;
pub mod day;
pub mod engine;
pub mod fingerprint;
pub mod guard;
pub mod model;
pub mod store;
pub mod types;

// Re-exports
pub use consecutive::ConsecutiveSlots;
pub use day::{CutoffDayResolver, DayRange, DayResolver};
pub use engine::{plan_insert, InsertError, TimelineEngine};
pub use fingerprint::fingerprint;
pub use guard::{CancellationGuard, Cancelled};
pub use model::{
    DayTemplateId, MachineId, MesPayload, ObservationStateId, OperationId, OperationMerge,
    ReasonId, ShiftId, StateTemplateId, WorkOrderId,
};
pub use store::{
    DeleteRef, FetchOptions, InMemorySlotStore, SlotDiff, SlotStore, StoreError,
};
pub use types::{
    Association, AssociationOptions, Bound, MergeError, MergeStrategy, OverrideMerge,
    PartitionKey, Range, Side, Slot, SlotId, SlotPayload, TimeRange,
};
