//! DaySession against the in-memory store.

use std::sync::Arc;

use roster_grid::{Clock, InteractionMode, SlotCatalog};
use roster_reconcile::{
    DayEntryDto, DaySession, ItemDto, ReconcileError, RosterStore, StoreError, SyncPhase,
};
use roster_testing::fixtures::{cell, clock_at, date, location_id, monday, sample_store, slot, staff_id};
use roster_testing::{location, InMemoryStore};

/// Tuesday, edited from Monday noon: nothing is locked.
fn tuesday() -> chrono::NaiveDate {
    date(2026, 3, 3)
}

async fn open_tuesday(store: &Arc<InMemoryStore>) -> DaySession<InMemoryStore> {
    let clock: Arc<dyn Clock> = clock_at(monday(), 12, 0);
    DaySession::open(tuesday(), store.clone(), Arc::new(SlotCatalog::default()), clock)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_open_loads_one_row_per_staff() {
    let store = Arc::new(sample_store());
    store.seed_item(tuesday(), staff_id(2), slot("09:00"), location_id(1));

    let session = open_tuesday(&store).await;
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert_eq!(session.matrix().rows().count(), 3);
    assert_eq!(session.matrix().len(), 1);

    let item = session.matrix().get(staff_id(2), slot("09:00")).unwrap();
    assert!(item.server_id.is_some());
    assert_eq!(item.color.as_ref().unwrap().as_str(), "#3b82f6");
    assert_eq!(
        session.matrix().row(staff_id(1)).unwrap().staff_code.as_deref(),
        Some("ABC")
    );
}

#[tokio::test]
async fn test_toggle_then_sync_confirms_identifiers() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");

    session.toggle_cell(staff_id(1), slot("08:00"), &ward).unwrap();
    assert_eq!(session.phase(), SyncPhase::Dirty);
    assert!(session.interaction_ended());

    let report = session.sync().await.unwrap();
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert!(!session.interaction_ended());
    assert_eq!(report.replaced, vec![staff_id(1)]);

    let row = session.matrix().row(staff_id(1)).unwrap();
    assert!(row.server_id.is_some());
    assert!(session.matrix().get(staff_id(1), slot("08:00")).unwrap().server_id.is_some());
    assert_eq!(
        store.stored_items(tuesday(), staff_id(1)),
        vec![(slot("08:00"), location_id(1))]
    );
}

#[tokio::test]
async fn test_clean_session_submits_nothing() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;

    assert!(session.begin_submission().unwrap().is_none());
    session.sync().await.unwrap();
    assert!(store.submissions().is_empty());
}

#[tokio::test]
async fn test_failed_submission_keeps_edits_and_retries() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(2, "Maternity", "EF4444");

    session.toggle_cell(staff_id(3), slot("10:00"), &ward).unwrap();
    store.fail_next_submit(StoreError::Unavailable("connection refused".into()));

    let err = session.sync().await.unwrap_err();
    assert!(matches!(err, ReconcileError::SyncFailed(_)));
    assert_eq!(session.phase(), SyncPhase::Failed);
    assert!(session.status().borrow().last_error.is_some());
    assert!(session.matrix().get(staff_id(3), slot("10:00")).is_some());
    assert!(session.matrix().is_touched(staff_id(3)));

    session.retry().await.unwrap();
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert_eq!(store.submissions().len(), 2);
    assert_eq!(store.submissions()[0], store.submissions()[1]);
    assert_eq!(
        store.stored_items(tuesday(), staff_id(3)),
        vec![(slot("10:00"), location_id(2))]
    );
}

#[tokio::test]
async fn test_only_one_submission_in_flight() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");

    session.toggle_cell(staff_id(1), slot("08:00"), &ward).unwrap();
    let ticket = session.begin_submission().unwrap().unwrap();
    assert_eq!(session.phase(), SyncPhase::Syncing);
    assert!(matches!(
        session.begin_submission(),
        Err(ReconcileError::SubmissionInFlight)
    ));

    let stale = ticket.clone();
    let answer = store.submit_day(tuesday(), ticket.payload().to_vec()).await;
    session.complete_submission(ticket, answer).unwrap();
    assert!(matches!(
        session.complete_submission(stale, Ok(vec![])),
        Err(ReconcileError::StaleTicket { .. })
    ));
}

#[tokio::test]
async fn test_mid_flight_edit_adopts_ids_and_follows_up() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");

    session.toggle_cell(staff_id(1), slot("08:00"), &ward).unwrap();
    let ticket = session.begin_submission().unwrap().unwrap();

    // The operator keeps editing the same row while the store works.
    session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap();
    assert_eq!(session.phase(), SyncPhase::Syncing);
    assert!(session.status().borrow().follow_up_queued);

    let answer = store.submit_day(tuesday(), ticket.payload().to_vec()).await;
    let report = session.complete_submission(ticket, answer).unwrap();
    assert_eq!(report.adopted, vec![staff_id(1)]);
    assert_eq!(session.phase(), SyncPhase::Dirty);

    let matrix = session.matrix();
    assert!(matrix.row(staff_id(1)).unwrap().server_id.is_some());
    assert!(matrix.get(staff_id(1), slot("08:00")).unwrap().server_id.is_some());
    assert!(matrix.get(staff_id(1), slot("09:00")).unwrap().server_id.is_none());

    session.sync().await.unwrap();
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert_eq!(
        store.stored_items(tuesday(), staff_id(1)),
        vec![(slot("08:00"), location_id(1)), (slot("09:00"), location_id(1))]
    );
    assert_eq!(store.record_count(tuesday()), 1);
}

#[tokio::test]
async fn test_mid_flight_edit_of_missing_row_drops_sent_items() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");

    session.toggle_cell(staff_id(1), slot("08:00"), &ward).unwrap();
    let ticket = session.begin_submission().unwrap().unwrap();
    session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap();

    // The store answers without any record for staff 1.
    let report = session.complete_submission(ticket, Ok(vec![])).unwrap();
    assert_eq!(report.cleared, vec![staff_id(1)]);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].submitted_items, 1);
    assert_eq!(session.phase(), SyncPhase::Dirty);

    let matrix = session.matrix();
    assert!(matrix.get(staff_id(1), slot("08:00")).is_none());
    assert!(matrix.get(staff_id(1), slot("09:00")).is_some());
    assert_eq!(matrix.row(staff_id(1)).unwrap().server_id, None);

    let follow_up = session.begin_submission().unwrap().unwrap();
    let slots: Vec<&str> = follow_up.payload()[0]
        .items
        .iter()
        .map(|i| i.slot_start.as_str())
        .collect();
    assert_eq!(slots, ["09:00"]);

    let answer = store.submit_day(tuesday(), follow_up.payload().to_vec()).await;
    session.complete_submission(follow_up, answer).unwrap();
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert_eq!(
        store.stored_items(tuesday(), staff_id(1)),
        vec![(slot("09:00"), location_id(1))]
    );
}

#[tokio::test]
async fn test_relocated_item_is_inserted_not_updated() {
    let store = Arc::new(sample_store());
    let (_, original) = store.seed_item(tuesday(), staff_id(1), slot("09:00"), location_id(3));
    let mut session = open_tuesday(&store).await;

    session.begin_relocate(cell(1, "09:00")).unwrap();
    session.complete_relocate(Some(cell(2, "11:00"))).unwrap();

    let ticket = session.begin_submission().unwrap().unwrap();
    let staff_ids: Vec<i64> = ticket.payload().iter().map(|e| e.staff_id.value()).collect();
    assert_eq!(staff_ids, [1, 2]);
    assert!(ticket.payload()[0].items.is_empty());
    assert_eq!(ticket.payload()[1].items[0].server_id, None);

    let answer = store.submit_day(tuesday(), ticket.payload().to_vec()).await;
    let report = session.complete_submission(ticket, answer).unwrap();
    assert_eq!(report.cleared, vec![staff_id(1)]);
    assert!(report.mismatches.is_empty());

    let moved = session.matrix().get(staff_id(2), slot("11:00")).unwrap();
    assert!(moved.server_id.is_some());
    assert_ne!(moved.server_id, Some(original));
    assert_eq!(session.matrix().row(staff_id(1)).unwrap().server_id, None);
    assert_eq!(store.record_count(tuesday()), 1);
}

#[tokio::test]
async fn test_dropped_items_are_reported_as_mismatch() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");
    store.omit_from_answers(staff_id(2));

    session.toggle_cell(staff_id(2), slot("14:00"), &ward).unwrap();
    let report = session.sync().await.unwrap();

    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].staff_id, staff_id(2));
    assert_eq!(report.mismatches[0].submitted_items, 1);
    assert!(session.matrix().allocations_for(staff_id(2)).is_empty());
    assert_eq!(session.phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_invalid_answer_merges_nothing() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let ward = location(1, "Surgical Center", "3B82F6");

    session.toggle_cell(staff_id(1), slot("08:00"), &ward).unwrap();
    store.answer_next_submit_with(vec![DayEntryDto {
        server_id: None,
        staff_id: staff_id(1),
        staff_code: None,
        date: tuesday(),
        items: vec![ItemDto {
            server_id: None,
            location_id: location_id(1),
            slot_start: "25:00".into(),
            color: None,
            icon: None,
        }],
    }]);

    let err = session.sync().await.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidResponse(_)));
    assert_eq!(session.phase(), SyncPhase::Failed);
    let kept = session.matrix().get(staff_id(1), slot("08:00")).unwrap();
    assert_eq!(kept.server_id, None);
    assert!(session.matrix().is_touched(staff_id(1)));
}

#[tokio::test]
async fn test_locked_cell_rejection_leaves_session_clean() {
    let store = Arc::new(sample_store());
    let clock: Arc<dyn Clock> = clock_at(tuesday(), 10, 30);
    let mut session =
        DaySession::open(tuesday(), store.clone(), Arc::new(SlotCatalog::default()), clock)
            .await
            .unwrap();
    let ward = location(1, "Surgical Center", "3B82F6");

    let err = session.toggle_cell(staff_id(1), slot("09:00"), &ward).unwrap_err();
    assert!(err.is_locked());
    assert_eq!(session.phase(), SyncPhase::Clean);
    assert!(!session.interaction_ended());

    session.toggle_cell(staff_id(1), slot("11:00"), &ward).unwrap();
    assert_eq!(session.phase(), SyncPhase::Dirty);
}

#[tokio::test]
async fn test_observers_see_changes_and_status() {
    let store = Arc::new(sample_store());
    let mut session = open_tuesday(&store).await;
    let mut events = session.subscribe();
    let mut status = session.status();
    let ward = location(2, "Maternity", "EF4444");

    session.set_mode(InteractionMode::Paint).unwrap();
    session.begin_paint_stroke(&ward).unwrap();
    session.paint_cell_enter(staff_id(1), slot("12:00")).unwrap();
    session.paint_cell_enter(staff_id(1), slot("13:00")).unwrap();
    session.end_paint_stroke().unwrap();
    assert!(status.has_changed().unwrap());
    assert_eq!(status.borrow_and_update().phase, SyncPhase::Dirty);

    session.sync().await.unwrap();

    let received: Vec<String> = events
        .drain()
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(received, ["cell.assigned", "cell.assigned", "row.reconciled"]);
    assert_eq!(status.borrow().phase, SyncPhase::Clean);
}
