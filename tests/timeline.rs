//! End-to-end timeline tests.
//!
//! These drive the full engine (planner + in-memory store) through the
//! scenarios the insert algorithm exists for: splitting, no-op detection,
//! coalescing, merge options, clears, and unbounded ranges.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use timeline_kernel::{
    Association, AssociationOptions, CancellationGuard, CutoffDayResolver, InMemorySlotStore,
    InsertError, MachineId, MesPayload, OperationId, OperationMerge, OverrideMerge,
    PartitionKey, Slot, TimeRange, TimelineEngine, WorkOrderId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn at(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn span(lower: u32, upper: u32) -> TimeRange {
    TimeRange::new(Some(at(lower)), Some(at(upper)))
}

fn wo(n: i64) -> MesPayload {
    MesPayload::WorkOrder {
        work_order: WorkOrderId::new(n),
    }
}

fn machine() -> PartitionKey {
    MachineId::new(7).into()
}

fn engine() -> TimelineEngine<InMemorySlotStore<MesPayload>> {
    // Honors RUST_LOG; a no-op after the first test initializes it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    TimelineEngine::new(
        Arc::new(InMemorySlotStore::new()),
        Arc::new(CutoffDayResolver::midnight()),
    )
}

fn seed(
    engine: &TimelineEngine<InMemorySlotStore<MesPayload>>,
    range: TimeRange,
    payload: MesPayload,
) -> Slot<MesPayload> {
    let days = CutoffDayResolver::midnight();
    let slot = Slot::new(machine(), range, payload, &days);
    engine.store().seed(slot.clone());
    slot
}

fn timeline(
    engine: &TimelineEngine<InMemorySlotStore<MesPayload>>,
) -> Vec<(TimeRange, MesPayload)> {
    engine
        .store()
        .slots(machine())
        .into_iter()
        .map(|s| (*s.range(), s.payload().clone()))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Worked examples
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn splitting_a_covering_slot_into_three() {
    let engine = engine();
    seed(&engine, span(1, 10), wo(1));

    let assoc = Association::new(span(5, 7), wo(2), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(
        timeline(&engine),
        vec![
            (span(1, 5), wo(1)),
            (span(5, 7), wo(2)),
            (span(7, 10), wo(1)),
        ]
    );
}

#[tokio::test]
async fn identical_insert_leaves_the_stored_slot_alone() {
    let engine = engine();
    let original = seed(&engine, span(1, 10), wo(1));

    let assoc = Association::new(span(1, 10), wo(1), at(20));
    let diff = engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert!(diff.is_noop());
    // Not rewritten: the stored slot keeps its identity.
    let slots = engine.store().slots(machine());
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].id(), original.id());
}

#[tokio::test]
async fn merge_result_coalesces_with_left_slot_and_remainder_survives() {
    // [1,5)->1, [5,10)->2; insert [3,7)->1. The overlap of the second slot
    // takes the association's payload, its remainder keeps its own.
    let engine = engine();
    seed(&engine, span(1, 5), wo(1));
    seed(&engine, span(5, 10), wo(2));

    let assoc = Association::new(span(3, 7), wo(1), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(
        timeline(&engine),
        vec![(span(1, 7), wo(1)), (span(7, 10), wo(2))]
    );
}

#[tokio::test]
async fn merge_over_full_extent_coalesces_into_a_single_slot() {
    let engine = engine();
    seed(&engine, span(1, 5), wo(1));
    seed(&engine, span(5, 10), wo(2));

    let assoc = Association::new(span(3, 10), wo(1), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(timeline(&engine), vec![(span(1, 10), wo(1))]);
}

#[tokio::test]
async fn no_left_merge_keeps_the_adjacent_neighbor_untouched() {
    let engine = engine();
    let neighbor = seed(&engine, span(1, 5), wo(1));

    let assoc = Association::new(span(5, 9), wo(1), at(20)).with_options(AssociationOptions {
        no_left_merge: true,
        no_right_merge: false,
    });
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    let slots = engine.store().slots(machine());
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].id(), neighbor.id());
    assert_eq!(*slots[1].range(), span(5, 9));
}

#[tokio::test]
async fn left_merge_coalesces_with_the_adjacent_neighbor() {
    let engine = engine();
    seed(&engine, span(1, 5), wo(1));

    let assoc = Association::new(span(5, 9), wo(1), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(timeline(&engine), vec![(span(1, 9), wo(1))]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Clears and unbounded ranges
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_removes_coverage_only_inside_its_range() {
    let engine = engine();
    seed(&engine, span(1, 10), wo(1));
    seed(&engine, span(10, 15), wo(2));

    let assoc = Association::clear(span(3, 7), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(
        timeline(&engine),
        vec![
            (span(1, 3), wo(1)),
            (span(7, 10), wo(1)),
            (span(10, 15), wo(2)),
        ]
    );
}

#[tokio::test]
async fn unbounded_association_merges_with_unbounded_slot() {
    let engine = engine();
    seed(&engine, TimeRange::new(None, Some(at(5))), wo(1));

    let assoc = Association::new(TimeRange::new(None, Some(at(9))), wo(1), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(
        timeline(&engine),
        vec![(TimeRange::new(None, Some(at(9))), wo(1))]
    );
}

#[tokio::test]
async fn open_ended_association_covers_the_rest_of_the_domain() {
    let engine = engine();
    seed(&engine, span(1, 5), wo(1));

    let assoc = Association::new(TimeRange::new(Some(at(3)), None), wo(2), at(20));
    engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert_eq!(
        timeline(&engine),
        vec![
            (span(1, 3), wo(1)),
            (TimeRange::new(Some(at(3)), None), wo(2)),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Field-combining merge
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn assigning_an_operation_keeps_the_work_order_in_effect() {
    let engine = engine();
    seed(
        &engine,
        span(1, 10),
        MesPayload::Operation {
            operation: None,
            work_order: Some(WorkOrderId::new(100)),
            shift: None,
        },
    );

    let assoc = Association::new(
        span(3, 7),
        MesPayload::Operation {
            operation: Some(OperationId::new(2)),
            work_order: None,
            shift: None,
        },
        at(20),
    );
    engine
        .insert(machine(), &assoc, &OperationMerge, &CancellationGuard::none())
        .await
        .unwrap();

    let slots = engine.store().slots(machine());
    assert_eq!(slots.len(), 3);
    assert_eq!(
        *slots[1].payload(),
        MesPayload::Operation {
            operation: Some(OperationId::new(2)),
            work_order: Some(WorkOrderId::new(100)),
            shift: None,
        }
    );
    // The untouched remainders keep the bare work order.
    assert_eq!(slots[0].payload(), slots[2].payload());
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure paths
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tripped_guard_aborts_before_any_write() {
    let engine = engine();
    let before = seed(&engine, span(1, 10), wo(1));

    let guard = CancellationGuard::with_deadline(Instant::now() - Duration::from_secs(1));
    let assoc = Association::new(span(3, 7), wo(2), at(20));
    let err = engine
        .insert(machine(), &assoc, &OverrideMerge, &guard)
        .await
        .unwrap_err();

    assert!(matches!(err, InsertError::Cancelled(_)));
    assert_eq!(engine.store().slots(machine()), vec![before]);
}

#[tokio::test]
async fn stale_prefetch_surfaces_as_a_storage_conflict() {
    let engine = engine();
    seed(&engine, span(1, 10), wo(1));

    let candidates = engine.store().slots(machine());

    // Someone else rewrites the partition between fetch and apply.
    let interleaved = Association::new(span(1, 10), wo(3), at(19));
    engine
        .insert(
            machine(),
            &interleaved,
            &OverrideMerge,
            &CancellationGuard::none(),
        )
        .await
        .unwrap();

    let assoc = Association::new(span(3, 7), wo(2), at(20));
    let err = engine
        .insert_prefetched(
            machine(),
            &assoc,
            &OverrideMerge,
            &candidates,
            &CancellationGuard::none(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InsertError::StorageConflict(_)));
    // Conflict applied nothing: the interleaved state is intact.
    assert_eq!(timeline(&engine), vec![(span(1, 10), wo(3))]);
}

#[tokio::test]
async fn empty_association_changes_nothing() {
    let engine = engine();
    let before = seed(&engine, span(1, 10), wo(1));

    let assoc = Association::new(span(5, 5), wo(2), at(20));
    let diff = engine
        .insert(machine(), &assoc, &OverrideMerge, &CancellationGuard::none())
        .await
        .unwrap();

    assert!(diff.is_noop());
    assert_eq!(engine.store().slots(machine()), vec![before]);
}
