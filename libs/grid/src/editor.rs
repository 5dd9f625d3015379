//! Mutation engine: translates operator gestures into matrix operations.
//!
//! Gesture state (mode, palette selection, open stroke, open drag) lives in
//! an explicit [`SessionContext`] owned by the caller, so two grids never
//! share it. [`GridEditor`] borrows the matrix and the context for the
//! duration of one operation.

use serde::Serialize;
use tracing::debug;

use crate::{CellKey, DayMatrix, GridError, Location, MutationOutcome, SlotStart};
use roster_id::StaffId;

/// Which gesture family pointer input drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Drag an allocation from one cell to another.
    #[default]
    Relocate,
    /// Sweep the active location across cells.
    Paint,
}

#[derive(Debug, Clone)]
struct PaintStroke {
    last_entered: Option<CellKey>,
}

#[derive(Debug, Clone)]
struct Drag {
    from: CellKey,
    location: Location,
}

/// Per-grid gesture state.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    mode: InteractionMode,
    active_location: Option<Location>,
    stroke: Option<PaintStroke>,
    drag: Option<Drag>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Location a paint stroke applies.
    pub fn active_location(&self) -> Option<&Location> {
        self.active_location.as_ref()
    }

    pub fn is_painting(&self) -> bool {
        self.stroke.is_some()
    }

    /// Source cell of an open drag.
    pub fn dragging(&self) -> Option<CellKey> {
        self.drag.as_ref().map(|d| d.from)
    }

    /// Whether any gesture is still open.
    pub fn in_gesture(&self) -> bool {
        self.stroke.is_some() || self.drag.is_some()
    }

    fn enter_mode(&mut self, mode: InteractionMode) {
        self.stroke = None;
        self.drag = None;
        if self.mode == InteractionMode::Paint && mode != InteractionMode::Paint {
            self.active_location = None;
        }
        self.mode = mode;
    }
}

/// Applies gestures to one matrix.
#[derive(Debug)]
pub struct GridEditor<'a> {
    matrix: &'a mut DayMatrix,
    ctx: &'a mut SessionContext,
}

impl<'a> GridEditor<'a> {
    pub fn new(matrix: &'a mut DayMatrix, ctx: &'a mut SessionContext) -> Self {
        Self { matrix, ctx }
    }

    /// Click on a cell: same location removes it, anything else sets it.
    pub fn toggle_cell(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
        location: &Location,
    ) -> Result<MutationOutcome, GridError> {
        let holds = self
            .matrix
            .get(staff_id, slot)
            .is_some_and(|a| a.holds(location.id));
        if holds {
            self.matrix.remove(staff_id, slot)?;
            Ok(MutationOutcome::Changed)
        } else {
            self.matrix.set(staff_id, slot, location)
        }
    }

    /// Explicitly empty a cell.
    pub fn clear_cell(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<MutationOutcome, GridError> {
        Ok(match self.matrix.remove(staff_id, slot)? {
            Some(_) => MutationOutcome::Changed,
            None => MutationOutcome::Unchanged,
        })
    }

    // =========================================================================
    // Paint
    // =========================================================================

    /// Pick a palette location. Enters paint mode.
    pub fn select_paint_location(&mut self, location: &Location) -> Result<MutationOutcome, GridError> {
        if self.ctx.mode != InteractionMode::Paint {
            self.ctx.enter_mode(InteractionMode::Paint);
        }
        self.ctx.active_location = Some(location.clone());
        Ok(MutationOutcome::Unchanged)
    }

    /// Open a stroke painting `location`.
    pub fn begin_paint_stroke(&mut self, location: &Location) -> Result<MutationOutcome, GridError> {
        self.select_paint_location(location)?;
        self.ctx.stroke = Some(PaintStroke { last_entered: None });
        debug!(date = %self.matrix.date(), location_id = %location.id, "paint stroke started");
        Ok(MutationOutcome::Unchanged)
    }

    /// Open a stroke by pressing on a cell.
    ///
    /// An occupied cell lends its location to the stroke without changing.
    /// An empty cell receives the active location.
    pub fn begin_paint_stroke_at(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<MutationOutcome, GridError> {
        if self.ctx.mode != InteractionMode::Paint {
            return Err(GridError::invalid("not in paint mode"));
        }
        self.matrix.check_editable(slot)?;

        let key = CellKey::new(staff_id, slot);
        if let Some(existing) = self.matrix.get(staff_id, slot) {
            self.ctx.active_location = Some(existing.location());
            self.ctx.stroke = Some(PaintStroke {
                last_entered: Some(key),
            });
            return Ok(MutationOutcome::Unchanged);
        }

        let location = self
            .ctx
            .active_location
            .clone()
            .ok_or_else(|| GridError::invalid("no paint location selected"))?;
        let outcome = self.matrix.set(staff_id, slot, &location)?;
        self.ctx.stroke = Some(PaintStroke {
            last_entered: Some(key),
        });
        Ok(outcome)
    }

    /// Pointer entered a cell during a stroke.
    ///
    /// Locked cells are skipped with `SlotLocked`; the stroke stays open.
    pub fn paint_cell_enter(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<MutationOutcome, GridError> {
        let key = CellKey::new(staff_id, slot);
        let stroke = self
            .ctx
            .stroke
            .as_mut()
            .ok_or_else(|| GridError::invalid("no paint stroke in progress"))?;
        if stroke.last_entered == Some(key) {
            return Ok(MutationOutcome::Unchanged);
        }
        stroke.last_entered = Some(key);

        let location = self
            .ctx
            .active_location
            .as_ref()
            .ok_or_else(|| GridError::invalid("no paint location selected"))?;
        self.matrix.set(staff_id, slot, location)
    }

    /// Pointer lifted.
    pub fn end_paint_stroke(&mut self) -> Result<MutationOutcome, GridError> {
        if self.ctx.stroke.take().is_some() {
            debug!(date = %self.matrix.date(), "paint stroke ended");
        }
        Ok(MutationOutcome::Unchanged)
    }

    // =========================================================================
    // Relocate
    // =========================================================================

    /// Pick up the allocation at `from`.
    pub fn begin_relocate(&mut self, from: CellKey) -> Result<MutationOutcome, GridError> {
        if self.ctx.mode != InteractionMode::Relocate {
            return Err(GridError::invalid("not in relocate mode"));
        }
        self.matrix.check_editable(from.slot)?;
        let location = self
            .matrix
            .get(from.staff_id, from.slot)
            .map(|a| a.location())
            .ok_or_else(|| GridError::invalid(format!("cell {from} is empty")))?;

        self.ctx.drag = Some(Drag { from, location });
        Ok(MutationOutcome::Unchanged)
    }

    /// Drop the dragged allocation on `to`, or outside the grid on `None`.
    pub fn complete_relocate(&mut self, to: Option<CellKey>) -> Result<MutationOutcome, GridError> {
        let drag = self
            .ctx
            .drag
            .take()
            .ok_or_else(|| GridError::invalid("no relocation in progress"))?;

        match to {
            Some(to) => self.matrix.move_allocation(drag.from, to, &drag.location),
            None => Ok(MutationOutcome::Unchanged),
        }
    }

    pub fn cancel_relocate(&mut self) {
        self.ctx.drag = None;
    }

    /// Switch gesture family. Ends any open stroke or drag.
    pub fn set_mode(&mut self, mode: InteractionMode) -> Result<MutationOutcome, GridError> {
        self.ctx.enter_mode(mode);
        Ok(MutationOutcome::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridEvent, ManualClock, SlotCatalog};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use roster_id::LocationId;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn slot(s: &str) -> SlotStart {
        s.parse().unwrap()
    }

    fn staff(n: i64) -> StaffId {
        StaffId::new(n).unwrap()
    }

    fn location(n: i64) -> Location {
        Location::new(LocationId::new(n).unwrap(), None, None)
    }

    fn key(s: i64, at: &str) -> CellKey {
        CellKey::new(staff(s), slot(at))
    }

    /// Today at 07:30: the 07:00 slot is locked, 08:00 onwards is open.
    fn matrix() -> DayMatrix {
        let clock = ManualClock::new(day(2).and_hms_opt(7, 30, 0).unwrap());
        DayMatrix::new(day(2), Arc::new(SlotCatalog::default()), Arc::new(clock))
    }

    #[test]
    fn test_toggle_sets_then_removes() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);

        assert!(editor.toggle_cell(staff(1), slot("09:00"), &location(1)).unwrap().is_changed());
        assert!(editor.toggle_cell(staff(1), slot("09:00"), &location(2)).unwrap().is_changed());
        assert!(editor.toggle_cell(staff(1), slot("09:00"), &location(2)).unwrap().is_changed());
        assert!(m.get(staff(1), slot("09:00")).is_none());
    }

    #[test]
    fn test_paint_stroke_skips_locked_cell() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);

        editor.begin_paint_stroke(&location(1)).unwrap();
        let err = editor.paint_cell_enter(staff(1), slot("07:00")).unwrap_err();
        assert!(err.is_locked());
        editor.paint_cell_enter(staff(1), slot("08:00")).unwrap();
        editor.paint_cell_enter(staff(1), slot("09:00")).unwrap();
        editor.end_paint_stroke().unwrap();

        assert!(m.get(staff(1), slot("07:00")).is_none());
        assert!(m.get(staff(1), slot("08:00")).unwrap().holds(LocationId::new(1).unwrap()));
        assert!(m.get(staff(1), slot("09:00")).unwrap().holds(LocationId::new(1).unwrap()));
        assert_eq!(m.drain_events().len(), 2);
    }

    #[test]
    fn test_paint_ignores_repeated_enter() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);

        editor.begin_paint_stroke(&location(1)).unwrap();
        assert!(editor.paint_cell_enter(staff(1), slot("08:00")).unwrap().is_changed());
        assert_eq!(
            editor.paint_cell_enter(staff(1), slot("08:00")).unwrap(),
            MutationOutcome::Unchanged
        );
        editor.paint_cell_enter(staff(1), slot("09:00")).unwrap();
        assert_eq!(
            editor.paint_cell_enter(staff(1), slot("08:00")).unwrap(),
            MutationOutcome::Unchanged
        );
        assert_eq!(m.drain_events().len(), 2);
    }

    #[test]
    fn test_paint_enter_without_stroke_is_rejected() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);

        let err = editor.paint_cell_enter(staff(1), slot("09:00")).unwrap_err();
        assert_eq!(err.rejection(), crate::Rejection::Invalid);
    }

    #[test]
    fn test_stroke_started_on_occupied_cell_adopts_its_location() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(3)).unwrap();
        m.drain_events();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.select_paint_location(&location(1)).unwrap();
        let out = editor.begin_paint_stroke_at(staff(1), slot("09:00")).unwrap();
        assert_eq!(out, MutationOutcome::Unchanged);
        editor.paint_cell_enter(staff(1), slot("10:00")).unwrap();
        editor.end_paint_stroke().unwrap();

        assert_eq!(ctx.active_location().unwrap().id.value(), 3);
        assert_eq!(m.get(staff(1), slot("10:00")).unwrap().location_id.value(), 3);
    }

    #[test]
    fn test_stroke_on_empty_cell_needs_selection() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.set_mode(InteractionMode::Paint).unwrap();

        assert!(editor.begin_paint_stroke_at(staff(1), slot("09:00")).is_err());
        editor.select_paint_location(&location(2)).unwrap();
        assert!(editor.begin_paint_stroke_at(staff(1), slot("09:00")).unwrap().is_changed());
        assert!(editor
            .begin_paint_stroke_at(staff(1), slot("07:00"))
            .unwrap_err()
            .is_locked());
    }

    #[test]
    fn test_relocate_onto_itself_is_unchanged() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();
        m.take_touched();
        m.drain_events();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.begin_relocate(key(1, "09:00")).unwrap();
        let out = editor.complete_relocate(Some(key(1, "09:00"))).unwrap();

        assert_eq!(out, MutationOutcome::Unchanged);
        assert!(m.touched_staff().is_empty());
        assert!(m.drain_events().is_empty());
    }

    #[test]
    fn test_relocate_onto_locked_target_changes_nothing() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.begin_relocate(key(1, "09:00")).unwrap();
        let err = editor.complete_relocate(Some(key(2, "07:00"))).unwrap_err();

        assert!(err.is_locked());
        assert!(m.get(staff(1), slot("09:00")).is_some());
        assert!(m.get(staff(2), slot("07:00")).is_none());
        assert!(!ctx.in_gesture());
    }

    #[test]
    fn test_relocate_overwrites_destination() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();
        m.set(staff(2), slot("10:00"), &location(2)).unwrap();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.begin_relocate(key(1, "09:00")).unwrap();
        editor.complete_relocate(Some(key(2, "10:00"))).unwrap();

        assert_eq!(m.len(), 1);
        assert_eq!(m.get(staff(2), slot("10:00")).unwrap().location_id.value(), 1);
    }

    #[test]
    fn test_drop_outside_grid_cancels() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();
        m.drain_events();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.begin_relocate(key(1, "09:00")).unwrap();
        assert_eq!(editor.complete_relocate(None).unwrap(), MutationOutcome::Unchanged);
        assert!(m.get(staff(1), slot("09:00")).is_some());
        assert!(m.drain_events().is_empty());
    }

    #[test]
    fn test_relocate_requires_occupied_unlocked_source() {
        let mut m = matrix();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);

        assert!(editor.begin_relocate(key(1, "09:00")).is_err());
        assert!(editor.begin_relocate(key(1, "07:00")).unwrap_err().is_locked());
        assert!(editor.complete_relocate(Some(key(1, "10:00"))).is_err());
    }

    #[test]
    fn test_mode_switch_ends_gestures() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();

        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.begin_relocate(key(1, "09:00")).unwrap();
        editor.set_mode(InteractionMode::Paint).unwrap();
        assert!(editor.complete_relocate(Some(key(1, "10:00"))).is_err());

        editor.begin_paint_stroke(&location(2)).unwrap();
        editor.set_mode(InteractionMode::Relocate).unwrap();
        assert!(editor.paint_cell_enter(staff(1), slot("10:00")).is_err());
        assert!(ctx.active_location().is_none());
        assert_eq!(ctx.mode(), InteractionMode::Relocate);
    }

    #[test]
    fn test_paint_mode_rejects_relocate() {
        let mut m = matrix();
        m.set(staff(1), slot("09:00"), &location(1)).unwrap();
        let mut ctx = SessionContext::new();
        let mut editor = GridEditor::new(&mut m, &mut ctx);
        editor.set_mode(InteractionMode::Paint).unwrap();
        assert!(editor.begin_relocate(key(1, "09:00")).is_err());
    }

    proptest! {
        #[test]
        fn prop_paint_sweep_is_idempotent(
            hours in proptest::collection::vec(7..19u32, 1..40),
            staff_ids in proptest::collection::vec(1..3i64, 1..40),
        ) {
            let mut m = matrix();
            let mut ctx = SessionContext::new();
            let mut editor = GridEditor::new(&mut m, &mut ctx);
            editor.begin_paint_stroke(&location(1)).unwrap();

            let mut changed = 0;
            let mut painted = BTreeSet::new();
            for (h, s) in hours.iter().zip(staff_ids.iter().cycle()) {
                let at = SlotStart::new(*h, 0).unwrap();
                if let Ok(out) = editor.paint_cell_enter(staff(*s), at) {
                    if out.is_changed() {
                        changed += 1;
                    }
                }
                if *h > 7 {
                    painted.insert(CellKey::new(staff(*s), at));
                }
            }
            editor.end_paint_stroke().unwrap();

            prop_assert_eq!(changed, painted.len());
            prop_assert_eq!(m.len(), painted.len());
            let events = m.drain_events();
            prop_assert_eq!(events.len(), painted.len());
            let all_assigned = events.iter().all(|e| matches!(e, GridEvent::CellAssigned { .. }));
            prop_assert!(all_assigned);
            prop_assert!(m.allocations().all(|a| a.slot.time() > chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap()));
        }
    }
}
