//! One open roster day.
//!
//! A `DaySession` owns the matrix of the date being edited, its gesture
//! context, its sync tracker and its event bus. Grid operations are
//! synchronous; only loading and submitting await the store.

use std::sync::Arc;

use chrono::NaiveDate;
use roster_events::{EventBus, Subscription, DEFAULT_BUS_CAPACITY};
use roster_grid::{
    CellKey, Clock, DayMatrix, GridEditor, GridError, GridEvent, InteractionMode, Location,
    MutationOutcome, SessionContext, SlotCatalog, SlotStart,
};
use roster_id::StaffId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::merge::merge_response;
use crate::state::SyncTracker;
use crate::{
    build_payload, validate_day, DayEntryDto, MergeReport, ReconcileError, RosterStore,
    StoreError, SubmissionTicket, SyncPhase, SyncStatus,
};

/// Build a matrix for `date` from a store answer.
pub fn load_matrix(
    date: NaiveDate,
    catalog: Arc<SlotCatalog>,
    clock: Arc<dyn Clock>,
    entries: Vec<DayEntryDto>,
) -> Result<DayMatrix, ReconcileError> {
    let days = validate_day(date, &catalog, entries)?;
    let mut matrix = DayMatrix::new(date, catalog, clock);
    matrix.load(days.into_iter().map(|d| (d.row, d.items)));
    Ok(matrix)
}

/// The grid of one date, kept in sync with the store.
pub struct DaySession<S> {
    store: Arc<S>,
    matrix: DayMatrix,
    ctx: SessionContext,
    tracker: SyncTracker,
    bus: EventBus<GridEvent>,
    interaction_ended: bool,
}

impl<S> std::fmt::Debug for DaySession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaySession")
            .field("date", &self.matrix.date())
            .field("phase", &self.tracker.phase())
            .field("allocations", &self.matrix.len())
            .finish_non_exhaustive()
    }
}

impl<S: RosterStore> DaySession<S> {
    /// Load `date` from the store into a clean session.
    pub async fn open(
        date: NaiveDate,
        store: Arc<S>,
        catalog: Arc<SlotCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ReconcileError> {
        let entries = store
            .fetch_day(date)
            .await
            .map_err(|e| ReconcileError::load_day(date, e))?;
        let mut matrix = load_matrix(date, catalog, clock, entries)?;
        info!(date = %date, rows = matrix.rows().count(), allocations = matrix.len(), "opened roster day");

        let mut bus = EventBus::new(DEFAULT_BUS_CAPACITY);
        for event in matrix.drain_events() {
            publish(&mut bus, date, event);
        }

        Ok(Self {
            store,
            matrix,
            ctx: SessionContext::new(),
            tracker: SyncTracker::new(date),
            bus,
            interaction_ended: false,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.matrix.date()
    }

    pub fn matrix(&self) -> &DayMatrix {
        &self.matrix
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn phase(&self) -> SyncPhase {
        self.tracker.phase()
    }

    /// Watch sync status changes.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.tracker.watch()
    }

    /// Receive every accepted grid change from now on.
    pub fn subscribe(&self) -> Subscription<GridEvent> {
        self.bus.subscribe()
    }

    /// Whether a gesture ended with edits waiting to be submitted.
    pub fn interaction_ended(&self) -> bool {
        self.interaction_ended && self.tracker.phase().has_pending()
    }

    // =========================================================================
    // Grid operations
    // =========================================================================

    pub fn toggle_cell(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
        location: &Location,
    ) -> Result<MutationOutcome, GridError> {
        self.apply(true, |e| e.toggle_cell(staff_id, slot, location))
    }

    pub fn clear_cell(&mut self, staff_id: StaffId, slot: SlotStart) -> Result<MutationOutcome, GridError> {
        self.apply(true, |e| e.clear_cell(staff_id, slot))
    }

    pub fn select_paint_location(&mut self, location: &Location) -> Result<MutationOutcome, GridError> {
        self.apply(false, |e| e.select_paint_location(location))
    }

    pub fn begin_paint_stroke(&mut self, location: &Location) -> Result<MutationOutcome, GridError> {
        self.apply(false, |e| e.begin_paint_stroke(location))
    }

    pub fn begin_paint_stroke_at(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<MutationOutcome, GridError> {
        self.apply(false, |e| e.begin_paint_stroke_at(staff_id, slot))
    }

    pub fn paint_cell_enter(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<MutationOutcome, GridError> {
        self.apply(false, |e| e.paint_cell_enter(staff_id, slot))
    }

    pub fn end_paint_stroke(&mut self) -> Result<MutationOutcome, GridError> {
        self.apply(true, |e| e.end_paint_stroke())
    }

    pub fn begin_relocate(&mut self, from: CellKey) -> Result<MutationOutcome, GridError> {
        self.apply(false, |e| e.begin_relocate(from))
    }

    pub fn complete_relocate(&mut self, to: Option<CellKey>) -> Result<MutationOutcome, GridError> {
        self.apply(true, |e| e.complete_relocate(to))
    }

    pub fn cancel_relocate(&mut self) {
        GridEditor::new(&mut self.matrix, &mut self.ctx).cancel_relocate();
    }

    pub fn set_mode(&mut self, mode: InteractionMode) -> Result<MutationOutcome, GridError> {
        self.apply(true, |e| e.set_mode(mode))
    }

    fn apply<F>(&mut self, ends_interaction: bool, op: F) -> Result<MutationOutcome, GridError>
    where
        F: FnOnce(&mut GridEditor<'_>) -> Result<MutationOutcome, GridError>,
    {
        let result = op(&mut GridEditor::new(&mut self.matrix, &mut self.ctx));
        self.dispatch_events();
        if ends_interaction {
            self.interaction_ended = true;
        }
        if let Err(err) = &result {
            debug!(date = %self.date(), reason = %err.rejection(), error = %err, "mutation rejected");
        }
        result
    }

    fn dispatch_events(&mut self) {
        let date = self.matrix.date();
        for event in self.matrix.drain_events() {
            let mutated = event.mutated_staff();
            if !mutated.is_empty() {
                debug!(date = %date, staff = ?mutated, "local edit");
                self.tracker.record_mutation();
            }
            publish(&mut self.bus, date, event);
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Start a submission if edits are pending.
    ///
    /// Returns `Ok(None)` when there is nothing to send.
    pub fn begin_submission(&mut self) -> Result<Option<SubmissionTicket>, ReconcileError> {
        let Some(id) = self.tracker.begin()? else {
            return Ok(None);
        };
        let touched = self.matrix.take_touched();
        let payload = build_payload(&self.matrix, &touched);
        self.interaction_ended = false;

        debug!(
            date = %self.date(),
            ticket = id,
            entries = payload.len(),
            touched = touched.len(),
            "issued submission ticket"
        );
        Ok(Some(SubmissionTicket {
            id,
            date: self.date(),
            payload,
            touched,
        }))
    }

    /// Finish a submission with the store's answer.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        answer: Result<Vec<DayEntryDto>, StoreError>,
    ) -> Result<MergeReport, ReconcileError> {
        self.tracker.check(ticket.id)?;

        let validated = answer
            .map_err(ReconcileError::SyncFailed)
            .and_then(|entries| validate_day(self.date(), self.matrix.catalog(), entries));
        let days = match validated {
            Ok(days) => days,
            Err(err) => {
                warn!(date = %self.date(), ticket = ticket.id, error = %err, "submission failed");
                self.matrix.restore_touched(ticket.touched);
                self.tracker.fail(err.to_string());
                return Err(err);
            }
        };

        let report = merge_response(&mut self.matrix, &ticket.payload, days);
        self.dispatch_events();
        self.tracker.succeed();

        info!(
            date = %self.date(),
            ticket = ticket.id,
            replaced = report.replaced.len(),
            cleared = report.cleared.len(),
            mismatches = report.mismatches.len(),
            phase = %self.tracker.phase(),
            "submission confirmed"
        );
        Ok(report)
    }

    /// Submit until the session is clean or a submission fails.
    pub async fn sync(&mut self) -> Result<MergeReport, ReconcileError> {
        let mut report = MergeReport::default();
        while let Some(ticket) = self.begin_submission()? {
            info!(date = %self.date(), ticket = ticket.id, entries = ticket.payload.len(), "submitting roster day");
            let answer = self
                .store
                .submit_day(ticket.date, ticket.payload.clone())
                .await;
            report.absorb(self.complete_submission(ticket, answer)?);
        }
        Ok(report)
    }

    /// Retry after a failure. Same as [`sync`](Self::sync).
    pub async fn retry(&mut self) -> Result<MergeReport, ReconcileError> {
        self.sync().await
    }
}

fn publish(bus: &mut EventBus<GridEvent>, date: NaiveDate, event: GridEvent) {
    if let Err(err) = bus.publish(date, event) {
        warn!(date = %date, error = %err, "failed to publish grid event");
    }
}
