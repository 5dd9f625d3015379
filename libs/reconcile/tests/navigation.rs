//! Roster date navigation and weekly aggregation.

use std::sync::Arc;

use roster_grid::{Clock, SlotCatalog};
use roster_reconcile::{NavigationPolicy, ReconcileError, Roster, StoreError, SyncPhase};
use roster_testing::fixtures::{clock_at, date, location_id, monday, sample_store, slot, staff_id};
use roster_testing::{location, InMemoryStore, StoreCall};

fn roster(store: &Arc<InMemoryStore>) -> Roster<InMemoryStore> {
    let clock: Arc<dyn Clock> = clock_at(monday(), 6, 0);
    Roster::new(store.clone(), Arc::new(SlotCatalog::default()), clock)
}

#[tokio::test]
async fn test_reference_data_is_loaded_once() {
    let store = Arc::new(sample_store());
    let mut roster = roster(&store);
    roster.load_reference_data().await.unwrap();

    assert_eq!(roster.locations().len(), 3);
    assert_eq!(roster.staff().len(), 3);
    assert_eq!(roster.location(location_id(2)).unwrap().name, "Maternity");
    assert!(roster.location(location_id(9)).is_none());
    assert!(matches!(
        store.calls().as_slice(),
        [StoreCall::ListLocations { active_only: true }, StoreCall::ListStaff { .. }]
    ));
}

#[tokio::test]
async fn test_flush_submits_before_switching() {
    let store = Arc::new(sample_store());
    let mut roster = roster(&store);
    let ward = location(1, "Surgical Center", "3B82F6");

    let session = roster.switch_date(monday(), NavigationPolicy::Flush).await.unwrap();
    session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap();

    let session = roster
        .switch_date(date(2026, 3, 3), NavigationPolicy::Flush)
        .await
        .unwrap();
    assert_eq!(session.date(), date(2026, 3, 3));
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert_eq!(
        store.stored_items(monday(), staff_id(1)),
        vec![(slot("09:00"), location_id(1))]
    );
}

#[tokio::test]
async fn test_failed_flush_keeps_current_day() {
    let store = Arc::new(sample_store());
    let mut roster = roster(&store);
    let ward = location(1, "Surgical Center", "3B82F6");

    let session = roster.switch_date(monday(), NavigationPolicy::Flush).await.unwrap();
    session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap();
    store.fail_next_submit(StoreError::Rejected {
        status: 503,
        message: "maintenance".into(),
    });

    let err = roster
        .switch_date(date(2026, 3, 3), NavigationPolicy::Flush)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::SyncFailed(_)));

    let session = roster.session().unwrap();
    assert_eq!(session.date(), monday());
    assert_eq!(session.phase(), SyncPhase::Failed);
    assert!(session.matrix().get(staff_id(1), slot("09:00")).is_some());
}

#[tokio::test]
async fn test_discard_drops_pending_edits() {
    let store = Arc::new(sample_store());
    let mut roster = roster(&store);
    let ward = location(1, "Surgical Center", "3B82F6");

    let session = roster.switch_date(monday(), NavigationPolicy::Flush).await.unwrap();
    session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap();

    roster
        .switch_date(date(2026, 3, 3), NavigationPolicy::Discard)
        .await
        .unwrap();
    assert!(store.submissions().is_empty());

    let back = roster.switch_date(monday(), NavigationPolicy::Discard).await.unwrap();
    assert!(back.matrix().is_empty());
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let store = Arc::new(sample_store());
    let mut roster = roster(&store);
    store.fail_next_fetch(StoreError::Unavailable("dns".into()));

    let err = roster.switch_date(monday(), NavigationPolicy::Flush).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Load { .. }));
    assert!(roster.session().is_none());
}

#[tokio::test]
async fn test_week_includes_open_day_edits() {
    let store = Arc::new(sample_store());
    store.seed_item(monday(), staff_id(1), slot("08:00"), location_id(1));
    store.seed_item(monday(), staff_id(1), slot("09:00"), location_id(1));
    store.seed_item(date(2026, 3, 6), staff_id(2), slot("10:00"), location_id(2));

    let mut roster = roster(&store);
    let ward = location(3, "Day Clinic", "10b981");
    let session = roster
        .switch_date(date(2026, 3, 4), NavigationPolicy::Flush)
        .await
        .unwrap();
    session.toggle_cell(staff_id(3), slot("15:00"), &ward).unwrap();

    let week = roster.load_week(date(2026, 3, 5)).await.unwrap();
    assert_eq!(week.start, monday());
    assert_eq!(week.end, date(2026, 3, 8));
    assert_eq!(week.staff.len(), 3);
    assert_eq!(week.staff_week(staff_id(1)).unwrap().slots_per_day, [2, 0, 0, 0, 0, 0, 0]);
    assert_eq!(week.staff_week(staff_id(2)).unwrap().slots_per_day, [0, 0, 0, 0, 1, 0, 0]);
    assert_eq!(week.staff_week(staff_id(3)).unwrap().slots_per_day, [0, 0, 1, 0, 0, 0, 0]);
    assert_eq!(week.location_totals[&location_id(1)], 2);
    assert_eq!(week.location_totals[&location_id(3)], 1);

    let fetched = store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::FetchDay { .. }))
        .count();
    // One fetch to open Wednesday, six more for the rest of the week.
    assert_eq!(fetched, 7);
}
