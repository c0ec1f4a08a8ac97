//! Associations: requested fact updates not yet reconciled with the timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::range::TimeRange;
use crate::types::slot::{Slot, SlotPayload};

/// Options restricting how an association interacts with its neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationOptions {
    /// Do not coalesce with the slot ending exactly at the association's
    /// lower boundary, even when its content matches.
    pub no_left_merge: bool,
    /// Do not coalesce with the slot starting exactly at the association's
    /// upper boundary, even when its content matches.
    pub no_right_merge: bool,
}

/// A new fact valid over a date/time range, to be merged into a partition's
/// existing slot sequence.
///
/// An association is a delta request, never persisted as a slot itself. A
/// `None` payload means "clear": existing coverage over the range is removed
/// and nothing is synthesized in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association<P> {
    range: TimeRange,
    as_of: DateTime<Utc>,
    options: AssociationOptions,
    payload: Option<P>,
}

impl<P: SlotPayload> Association<P> {
    /// Association asserting `payload` over `range`.
    pub fn new(range: TimeRange, payload: P, as_of: DateTime<Utc>) -> Self {
        Self {
            range,
            as_of,
            options: AssociationOptions::default(),
            payload: Some(payload),
        }
    }

    /// Association clearing all coverage over `range`.
    pub fn clear(range: TimeRange, as_of: DateTime<Utc>) -> Self {
        Self {
            range,
            as_of,
            options: AssociationOptions::default(),
            payload: None,
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: AssociationOptions) -> Self {
        self.options = options;
        self
    }

    /// The asserted range.
    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    /// When the fact was asserted.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// The merge options.
    pub fn options(&self) -> AssociationOptions {
        self.options
    }

    /// The asserted payload, `None` for a clear request.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// True for a clear request.
    pub fn is_clear(&self) -> bool {
        self.payload.is_none()
    }
}

/// Failure raised by a caller-supplied merge function.
///
/// The insert algorithm never recovers from it: the error propagates and the
/// whole insert aborts with no partial diff.
#[derive(Debug, Clone, Error)]
#[error("merge function failed: {0}")]
pub struct MergeError(String);

impl MergeError {
    /// Wrap a merge failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Caller-supplied merge function: decides what holds over the overlap of an
/// association and an existing slot.
///
/// Must be pure (no I/O) and is called at most once per (association,
/// impacted slot) pair. The overlap sub-range is passed for context only; the
/// result applies to exactly that sub-range. Returning `Ok(None)` means
/// nothing holds there and the overlap becomes a gap.
pub trait MergeStrategy<P: SlotPayload> {
    /// Payload that should hold over `overlap`, or `None` for a gap.
    fn merge(
        &self,
        association: &Association<P>,
        existing: &Slot<P>,
        overlap: &TimeRange,
    ) -> Result<Option<P>, MergeError>;
}

/// Default merge: the association's payload (or clear) wins over every
/// overlap, regardless of what the existing slot holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideMerge;

impl<P: SlotPayload> MergeStrategy<P> for OverrideMerge {
    fn merge(
        &self,
        association: &Association<P>,
        _existing: &Slot<P>,
        _overlap: &TimeRange,
    ) -> Result<Option<P>, MergeError> {
        Ok(association.payload().cloned())
    }
}
