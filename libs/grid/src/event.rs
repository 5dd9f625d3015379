//! Change events emitted by the day matrix.

use roster_events::EventPayload;
use roster_id::{LocationId, RosterId, StaffId};
use serde::Serialize;

use crate::{CellKey, SlotStart};

/// An accepted change to a [`DayMatrix`](crate::DayMatrix).
///
/// Local mutations mark their staff as touched and make the session dirty.
/// Reconciliation events record server truth and never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridEvent {
    CellAssigned {
        staff_id: StaffId,
        slot: SlotStart,
        location_id: LocationId,
        /// Location previously in the cell, if it was occupied.
        replaced: Option<LocationId>,
    },

    CellCleared {
        staff_id: StaffId,
        slot: SlotStart,
        location_id: LocationId,
    },

    CellMoved {
        from: CellKey,
        to: CellKey,
        location_id: LocationId,
        /// Occupant of `to` that the move overwrote.
        displaced: Option<LocationId>,
    },

    RowReconciled {
        staff_id: StaffId,
        server_id: Option<RosterId>,
        items: usize,
    },

    DayLoaded {
        rows: usize,
        allocations: usize,
    },
}

impl GridEvent {
    /// Staff rows an operator edit changed. Empty for reconciliation events.
    pub fn mutated_staff(&self) -> Vec<StaffId> {
        match self {
            GridEvent::CellAssigned { staff_id, .. } | GridEvent::CellCleared { staff_id, .. } => {
                vec![*staff_id]
            }
            GridEvent::CellMoved { from, to, .. } if from.staff_id == to.staff_id => {
                vec![from.staff_id]
            }
            GridEvent::CellMoved { from, to, .. } => vec![from.staff_id, to.staff_id],
            GridEvent::RowReconciled { .. } | GridEvent::DayLoaded { .. } => Vec::new(),
        }
    }
}

impl EventPayload for GridEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GridEvent::CellAssigned { .. } => "cell.assigned",
            GridEvent::CellCleared { .. } => "cell.cleared",
            GridEvent::CellMoved { .. } => "cell.moved",
            GridEvent::RowReconciled { .. } => "row.reconciled",
            GridEvent::DayLoaded { .. } => "day.loaded",
        }
    }
}
