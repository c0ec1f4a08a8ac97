//! Payload model for the manufacturing-execution timelines.
//!
//! Every time-varying machine attribute is one [`MesPayload`] variant; the
//! insert algorithm stays generic and dispatches nothing at runtime. Ids are
//! integer newtypes mirroring the relational keys of the surrounding system.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::association::{Association, MergeError, MergeStrategy};
use crate::types::range::TimeRange;
use crate::types::slot::{PartitionKey, Slot, SlotPayload};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database id.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw id.
            pub fn id(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A machine (or line). One machine owns one timeline per attribute.
    MachineId
);
id_type!(
    /// An operation.
    OperationId
);
id_type!(
    /// A work order.
    WorkOrderId
);
id_type!(
    /// A shift.
    ShiftId
);
id_type!(
    /// A machine observation state (running, idle, maintenance, ...).
    ObservationStateId
);
id_type!(
    /// A machine state template.
    StateTemplateId
);
id_type!(
    /// A reason attached to an observation state.
    ReasonId
);
id_type!(
    /// A day template (shift pattern over a production day).
    DayTemplateId
);

impl From<MachineId> for PartitionKey {
    fn from(machine: MachineId) -> Self {
        PartitionKey::new(machine.id())
    }
}

/// The reference data a slot can hold, one variant per time-varying machine
/// attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MesPayload {
    /// Observation state of a machine, with optional template and shift.
    MachineState {
        /// The observation state.
        state: ObservationStateId,
        /// The template the state was derived from, if any.
        template: Option<StateTemplateId>,
        /// The shift in effect, if any.
        shift: Option<ShiftId>,
    },
    /// Operation assignment, with optional work order and shift.
    Operation {
        /// The assigned operation.
        operation: Option<OperationId>,
        /// The work order the operation runs under.
        work_order: Option<WorkOrderId>,
        /// The shift in effect.
        shift: Option<ShiftId>,
    },
    /// Work order assignment alone.
    WorkOrder {
        /// The assigned work order.
        work_order: WorkOrderId,
    },
    /// Day template in effect.
    DayTemplate {
        /// The template.
        template: DayTemplateId,
    },
    /// Reason attached to an observation state period.
    Reason {
        /// The reason.
        reason: ReasonId,
        /// Score of the reason, for automatic vs manual precedence.
        score: f64,
        /// Whether an operator must still overwrite this reason.
        overwrite_required: bool,
    },
}

impl SlotPayload for MesPayload {
    /// An operation variant with nothing assigned is empty; such slots are
    /// dropped rather than persisted.
    fn is_empty(&self) -> bool {
        matches!(
            self,
            Self::Operation {
                operation: None,
                work_order: None,
                shift: None,
            }
        )
    }
}

/// Merge for operation timelines: the association wins, but fields it leaves
/// unset are retained from the existing slot, so assigning an operation does
/// not discard the work order already in effect there.
///
/// Both sides must be [`MesPayload::Operation`]; mixing payload kinds on one
/// timeline is a caller error and fails the merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationMerge;

impl MergeStrategy<MesPayload> for OperationMerge {
    fn merge(
        &self,
        association: &Association<MesPayload>,
        existing: &Slot<MesPayload>,
        _overlap: &TimeRange,
    ) -> Result<Option<MesPayload>, MergeError> {
        let Some(incoming) = association.payload() else {
            return Ok(None);
        };
        match (incoming, existing.payload()) {
            (
                MesPayload::Operation {
                    operation,
                    work_order,
                    shift,
                },
                MesPayload::Operation {
                    work_order: existing_work_order,
                    shift: existing_shift,
                    ..
                },
            ) => Ok(Some(MesPayload::Operation {
                operation: *operation,
                work_order: work_order.or(*existing_work_order),
                shift: shift.or(*existing_shift),
            })),
            (incoming, existing) => Err(MergeError::new(format!(
                "operation merge applied to mismatched payloads: {incoming:?} onto {existing:?}"
            ))),
        }
    }
}
