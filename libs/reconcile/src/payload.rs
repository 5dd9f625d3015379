//! Outbound submission payload.

use std::collections::BTreeSet;

use roster_grid::DayMatrix;
use roster_id::StaffId;

use crate::{DayEntryDto, ItemDto};

/// Build the entries to submit for `matrix`.
///
/// Covers every staff member holding at least one allocation plus every
/// staff member in `touched`, so rows emptied by the operator go out with an
/// empty item list. Entries are ordered by staff id, items by slot.
pub fn build_payload(matrix: &DayMatrix, touched: &BTreeSet<StaffId>) -> Vec<DayEntryDto> {
    let mut staff: BTreeSet<StaffId> = matrix.allocations().map(|a| a.staff_id).collect();
    staff.extend(touched.iter().copied());

    staff
        .into_iter()
        .map(|staff_id| {
            let row = matrix.row(staff_id);
            DayEntryDto {
                server_id: row.and_then(|r| r.server_id),
                staff_id,
                staff_code: None,
                date: matrix.date(),
                items: matrix
                    .allocations_for(staff_id)
                    .into_iter()
                    .map(|a| ItemDto {
                        server_id: a.server_id,
                        location_id: a.location_id,
                        slot_start: a.slot.to_string(),
                        color: None,
                        icon: None,
                    })
                    .collect(),
            }
        })
        .collect()
}
