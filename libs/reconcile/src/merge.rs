//! Merge a confirmed submission back into the matrix.
//!
//! Rules per staff member:
//!
//! - In the answer and untouched since the submission: the server record
//!   replaces the local row.
//! - In the answer but edited again mid-flight: only identifiers are
//!   adopted, the newer local edits wait for the follow-up submission.
//! - Submitted but absent from the answer: the server holds nothing for
//!   this staff member on this date. Items that were sent are never kept;
//!   a row edited again mid-flight keeps only its newer edits.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use roster_grid::{DayMatrix, SlotStart};
use roster_id::StaffId;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{DayEntryDto, StaffDay};

/// Submitted items the store dropped without saying why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationMismatch {
    pub date: NaiveDate,
    pub staff_id: StaffId,
    pub submitted_items: usize,
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub replaced: Vec<StaffId>,
    pub adopted: Vec<StaffId>,
    pub cleared: Vec<StaffId>,
    pub mismatches: Vec<ReconciliationMismatch>,
}

impl MergeReport {
    /// Fold a later merge of the same session into this one.
    pub fn absorb(&mut self, other: MergeReport) {
        self.replaced.extend(other.replaced);
        self.adopted.extend(other.adopted);
        self.cleared.extend(other.cleared);
        self.mismatches.extend(other.mismatches);
    }

    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty()
            && self.adopted.is_empty()
            && self.cleared.is_empty()
            && self.mismatches.is_empty()
    }
}

/// Apply a validated answer to `submitted` onto `matrix`.
pub fn merge_response(
    matrix: &mut DayMatrix,
    submitted: &[DayEntryDto],
    answer: Vec<StaffDay>,
) -> MergeReport {
    let mut report = MergeReport::default();
    let mut answered: BTreeMap<StaffId, StaffDay> =
        answer.into_iter().map(|d| (d.staff_id(), d)).collect();

    for entry in submitted {
        let staff_id = entry.staff_id;
        if let Some(day) = answered.remove(&staff_id) {
            apply_staff_day(matrix, day, &mut report);
            continue;
        }

        if !entry.items.is_empty() {
            warn!(
                date = %matrix.date(),
                staff_id = %staff_id,
                submitted_items = entry.items.len(),
                "ReconciliationMismatch: submitted items missing from store answer"
            );
            report.mismatches.push(ReconciliationMismatch {
                date: matrix.date(),
                staff_id,
                submitted_items: entry.items.len(),
            });
        }
        if matrix.is_touched(staff_id) {
            let sent = entry.items.iter().filter_map(|item| {
                SlotStart::parse(&item.slot_start)
                    .ok()
                    .map(|slot| (slot, item.location_id))
            });
            matrix.retract_unconfirmed(staff_id, sent);
        } else {
            matrix.clear_row(staff_id);
        }
        report.cleared.push(staff_id);
    }

    // Records the store returned without being asked about.
    for (_, day) in answered {
        apply_staff_day(matrix, day, &mut report);
    }

    debug!(
        date = %matrix.date(),
        replaced = report.replaced.len(),
        adopted = report.adopted.len(),
        cleared = report.cleared.len(),
        "merged store answer"
    );
    report
}

fn apply_staff_day(matrix: &mut DayMatrix, day: StaffDay, report: &mut MergeReport) {
    let staff_id = day.staff_id();
    if !matrix.is_touched(staff_id) {
        matrix.replace_row(day.row, day.items);
        report.replaced.push(staff_id);
        return;
    }

    matrix.set_row_server_id(staff_id, day.row.server_id);
    for item in &day.items {
        if let Some(item_id) = item.server_id {
            matrix.adopt_item_id(item.key(), item.location_id, item_id);
        }
    }
    report.adopted.push(staff_id);
}
