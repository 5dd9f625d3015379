//! The allocation matrix for one date.
//!
//! `DayMatrix` is the single source of truth for what a grid shows. Cells are
//! keyed by `(staff, slot)` so lookups stay O(1) and a cell can never hold two
//! allocations. Operator edits go through [`DayMatrix::set`],
//! [`DayMatrix::remove`] and [`DayMatrix::move_allocation`], which enforce
//! catalog membership and the time lock. The `*_row` operations record server
//! truth during reconciliation and bypass the lock.
//!
//! Every accepted change is queued as a [`GridEvent`] in an outbox. The owner
//! drains it after each operation and forwards the events to its observers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use roster_id::{ItemId, LocationId, RosterId, StaffId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{Allocation, CellKey, Clock, GridError, GridEvent, Location, LockPolicy, SlotCatalog, SlotStart};

/// Result of an accepted mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The matrix changed and the session is now dirty.
    Changed,
    /// Nothing to do; no event was emitted.
    Unchanged,
}

impl MutationOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, MutationOutcome::Changed)
    }
}

/// Per-staff header of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRow {
    pub staff_id: StaffId,

    /// Display code, kept across merges that omit it.
    pub staff_code: Option<String>,

    /// Server record for this staff on this date.
    pub server_id: Option<RosterId>,
}

impl StaffRow {
    pub fn new(staff_id: StaffId) -> Self {
        Self {
            staff_id,
            staff_code: None,
            server_id: None,
        }
    }
}

/// Allocations of every staff member for one date.
#[derive(Debug)]
pub struct DayMatrix {
    date: NaiveDate,
    catalog: Arc<SlotCatalog>,
    clock: Arc<dyn Clock>,
    cells: HashMap<CellKey, Allocation>,
    rows: BTreeMap<StaffId, StaffRow>,
    touched: BTreeSet<StaffId>,
    outbox: Vec<GridEvent>,
}

impl DayMatrix {
    /// Create an empty matrix for `date`.
    pub fn new(date: NaiveDate, catalog: Arc<SlotCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            date,
            catalog,
            clock,
            cells: HashMap::new(),
            rows: BTreeMap::new(),
            touched: BTreeSet::new(),
            outbox: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn catalog(&self) -> &Arc<SlotCatalog> {
        &self.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current wall time as seen by the lock policy.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Whether `slot` is locked right now.
    pub fn is_locked(&self, slot: SlotStart) -> bool {
        LockPolicy::is_locked(self.date, slot, self.clock.now())
    }

    /// First slot still open for edits.
    pub fn lock_boundary(&self) -> Option<SlotStart> {
        LockPolicy::lock_boundary(self.date, &self.catalog, self.clock.now())
    }

    /// Reject slots outside the catalog or already locked.
    pub fn check_editable(&self, slot: SlotStart) -> Result<(), GridError> {
        if !self.catalog.contains(slot) {
            return Err(GridError::invalid(format!("slot {slot} is not in the catalog")));
        }
        if self.is_locked(slot) {
            return Err(GridError::SlotLocked {
                date: self.date,
                slot,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, staff_id: StaffId, slot: SlotStart) -> Option<&Allocation> {
        self.cells.get(&CellKey::new(staff_id, slot))
    }

    /// Allocations of one staff member in slot order.
    pub fn allocations_for(&self, staff_id: StaffId) -> Vec<&Allocation> {
        self.catalog
            .starts()
            .filter_map(|slot| self.get(staff_id, slot))
            .collect()
    }

    /// Every allocation, unordered.
    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.cells.values()
    }

    pub fn row(&self, staff_id: StaffId) -> Option<&StaffRow> {
        self.rows.get(&staff_id)
    }

    /// Staff rows ordered by staff id.
    pub fn rows(&self) -> impl Iterator<Item = &StaffRow> {
        self.rows.values()
    }

    /// Make sure `staff_id` has a row, filling in the code if it was unknown.
    pub fn ensure_row(&mut self, staff_id: StaffId, staff_code: Option<&str>) -> &StaffRow {
        let row = self
            .rows
            .entry(staff_id)
            .or_insert_with(|| StaffRow::new(staff_id));
        if row.staff_code.is_none() {
            row.staff_code = staff_code.map(str::to_string);
        }
        row
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // =========================================================================
    // Operator mutations
    // =========================================================================

    /// Place `location` in a cell, replacing whatever was there.
    pub fn set(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
        location: &Location,
    ) -> Result<MutationOutcome, GridError> {
        self.check_editable(slot)?;

        let key = CellKey::new(staff_id, slot);
        if self.cells.get(&key).is_some_and(|a| a.holds(location.id)) {
            return Ok(MutationOutcome::Unchanged);
        }

        let allocation = Allocation::unconfirmed(key, self.date, location);
        let replaced = self.cells.insert(key, allocation).map(|a| a.location_id);
        self.ensure_row(staff_id, None);
        self.touched.insert(staff_id);

        debug!(
            date = %self.date,
            staff_id = %staff_id,
            slot = %slot,
            location_id = %location.id,
            "cell assigned"
        );
        self.outbox.push(GridEvent::CellAssigned {
            staff_id,
            slot,
            location_id: location.id,
            replaced,
        });
        Ok(MutationOutcome::Changed)
    }

    /// Clear a cell. Clearing an empty cell is a no-op.
    pub fn remove(
        &mut self,
        staff_id: StaffId,
        slot: SlotStart,
    ) -> Result<Option<Allocation>, GridError> {
        let key = CellKey::new(staff_id, slot);
        if !self.cells.contains_key(&key) {
            if !self.catalog.contains(slot) {
                return Err(GridError::invalid(format!("slot {slot} is not in the catalog")));
            }
            return Ok(None);
        }
        self.check_editable(slot)?;

        let removed = self.cells.remove(&key);
        if let Some(allocation) = &removed {
            self.touched.insert(staff_id);
            debug!(
                date = %self.date,
                staff_id = %staff_id,
                slot = %slot,
                location_id = %allocation.location_id,
                "cell cleared"
            );
            self.outbox.push(GridEvent::CellCleared {
                staff_id,
                slot,
                location_id: allocation.location_id,
            });
        }
        Ok(removed)
    }

    /// Move the allocation at `from` to `to` as one step.
    ///
    /// Both cells are validated before anything changes. An occupied `to` is
    /// overwritten and its occupant discarded.
    pub fn move_allocation(
        &mut self,
        from: CellKey,
        to: CellKey,
        location: &Location,
    ) -> Result<MutationOutcome, GridError> {
        if from == to {
            return Ok(MutationOutcome::Unchanged);
        }
        self.check_editable(from.slot)?;
        self.check_editable(to.slot)?;
        if !self.cells.contains_key(&from) {
            return Err(GridError::invalid(format!("cell {from} is empty")));
        }

        self.cells.remove(&from);
        let allocation = Allocation::unconfirmed(to, self.date, location);
        let displaced = self.cells.insert(to, allocation).map(|a| a.location_id);
        self.ensure_row(to.staff_id, None);
        self.touched.insert(from.staff_id);
        self.touched.insert(to.staff_id);

        debug!(
            date = %self.date,
            from = %from,
            to = %to,
            location_id = %location.id,
            "cell moved"
        );
        self.outbox.push(GridEvent::CellMoved {
            from,
            to,
            location_id: location.id,
            displaced,
        });
        Ok(MutationOutcome::Changed)
    }

    // =========================================================================
    // Sync bookkeeping
    // =========================================================================

    /// Staff with local changes since the last confirmed submission.
    pub fn touched_staff(&self) -> &BTreeSet<StaffId> {
        &self.touched
    }

    pub fn is_touched(&self, staff_id: StaffId) -> bool {
        self.touched.contains(&staff_id)
    }

    /// Hand the touched set to an outgoing submission.
    pub fn take_touched(&mut self) -> BTreeSet<StaffId> {
        std::mem::take(&mut self.touched)
    }

    /// Put back the touched set of a submission that failed.
    pub fn restore_touched(&mut self, staff: BTreeSet<StaffId>) {
        self.touched.extend(staff);
    }

    /// Take all queued change events.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.outbox)
    }

    // =========================================================================
    // Server truth
    // =========================================================================

    /// Install freshly loaded rows, replacing all content.
    pub fn load<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (StaffRow, Vec<Allocation>)>,
    {
        self.cells.clear();
        self.rows.clear();
        self.touched.clear();
        self.outbox.clear();

        for (row, items) in rows {
            self.install_row(row, items);
        }
        self.outbox.push(GridEvent::DayLoaded {
            rows: self.rows.len(),
            allocations: self.cells.len(),
        });
    }

    /// Replace a staff row and its items with the server's record.
    ///
    /// A missing `staff_code` keeps the locally known one.
    pub fn replace_row(&mut self, row: StaffRow, items: Vec<Allocation>) {
        let staff_id = row.staff_id;
        let server_id = row.server_id;
        let count = self.install_row(row, items);
        self.outbox.push(GridEvent::RowReconciled {
            staff_id,
            server_id,
            items: count,
        });
    }

    /// Server confirmed the staff has nothing on this date.
    pub fn clear_row(&mut self, staff_id: StaffId) {
        self.replace_row(StaffRow::new(staff_id), Vec::new());
    }

    pub fn set_row_server_id(&mut self, staff_id: StaffId, server_id: Option<RosterId>) {
        let row = self
            .rows
            .entry(staff_id)
            .or_insert_with(|| StaffRow::new(staff_id));
        row.server_id = server_id;
    }

    /// Record a server id on a cell that still holds `location_id` unconfirmed.
    ///
    /// Returns false if the cell changed since the submission.
    pub fn adopt_item_id(&mut self, key: CellKey, location_id: LocationId, item_id: ItemId) -> bool {
        match self.cells.get_mut(&key) {
            Some(a) if a.holds(location_id) && a.server_id.is_none() => {
                a.server_id = Some(item_id);
                true
            }
            _ => false,
        }
    }

    /// The store holds nothing for `staff_id`, but the row was edited again
    /// after `sent` was submitted.
    ///
    /// Drops the cells that still hold exactly what was sent without a
    /// server id, keeps newer edits, and forgets the row's server id.
    /// Returns the number of cells dropped.
    pub fn retract_unconfirmed<I>(&mut self, staff_id: StaffId, sent: I) -> usize
    where
        I: IntoIterator<Item = (SlotStart, LocationId)>,
    {
        let mut dropped = 0;
        for (slot, location_id) in sent {
            let key = CellKey::new(staff_id, slot);
            let stale = self
                .cells
                .get(&key)
                .is_some_and(|a| a.holds(location_id) && a.server_id.is_none());
            if stale {
                self.cells.remove(&key);
                dropped += 1;
            }
        }
        self.set_row_server_id(staff_id, None);
        self.outbox.push(GridEvent::RowReconciled {
            staff_id,
            server_id: None,
            items: self.allocations_for(staff_id).len(),
        });
        dropped
    }

    fn install_row(&mut self, mut row: StaffRow, items: Vec<Allocation>) -> usize {
        let staff_id = row.staff_id;
        if row.staff_code.is_none() {
            row.staff_code = self.rows.get(&staff_id).and_then(|r| r.staff_code.clone());
        }
        self.cells.retain(|key, _| key.staff_id != staff_id);
        self.rows.insert(staff_id, row);

        let mut count = 0;
        for mut item in items {
            if !self.catalog.contains(item.slot) {
                warn!(
                    date = %self.date,
                    staff_id = %staff_id,
                    slot = %item.slot,
                    "dropping server item outside the slot catalog"
                );
                continue;
            }
            item.staff_id = staff_id;
            item.date = self.date;
            self.cells.insert(item.key(), item);
            count += 1;
        }
        count
    }
}
