//! Core value types of the timeline engine.

pub mod association;
pub mod bound;
pub mod range;
pub mod slot;

pub use association::{
    Association, AssociationOptions, MergeError, MergeStrategy, OverrideMerge,
};
pub use bound::{Bound, Side};
pub use range::{Range, TimeRange};
pub use slot::{PartitionKey, Slot, SlotId, SlotPayload};
