//! Wire records exchanged with the store, and their validation.
//!
//! Incoming records are checked in full before any of them touches a
//! matrix. A single bad record rejects the whole response.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use roster_grid::{Allocation, Color, Icon, SlotCatalog, SlotStart, StaffRow};
use roster_id::{ItemId, LocationId, RosterId, StaffId};
use serde::{Deserialize, Serialize};

use crate::ReconcileError;

/// One slot assignment inside a [`DayEntryDto`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub server_id: Option<ItemId>,
    pub location_id: LocationId,

    /// `HH:mm`, or `HH:mm:ss` as the store sends it.
    pub slot_start: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

/// One staff member's roster for a date.
///
/// Outbound, an empty `items` list means "delete everything for this staff
/// on this date".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntryDto {
    pub server_id: Option<RosterId>,
    pub staff_id: StaffId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_code: Option<String>,

    pub date: NaiveDate,

    #[serde(default)]
    pub items: Vec<ItemDto>,
}

/// A validated [`DayEntryDto`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDay {
    pub row: StaffRow,
    pub items: Vec<Allocation>,
}

impl StaffDay {
    pub fn staff_id(&self) -> StaffId {
        self.row.staff_id
    }
}

/// Validate every entry of a store answer for `date`.
pub fn validate_day(
    date: NaiveDate,
    catalog: &SlotCatalog,
    entries: Vec<DayEntryDto>,
) -> Result<Vec<StaffDay>, ReconcileError> {
    let mut seen = BTreeSet::new();
    let mut days = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.date != date {
            return Err(invalid(format!(
                "staff {} entry is dated {}, expected {date}",
                entry.staff_id, entry.date
            )));
        }
        if !seen.insert(entry.staff_id) {
            return Err(invalid(format!("staff {} appears twice", entry.staff_id)));
        }
        days.push(validate_entry(date, catalog, entry)?);
    }
    Ok(days)
}

fn validate_entry(
    date: NaiveDate,
    catalog: &SlotCatalog,
    entry: DayEntryDto,
) -> Result<StaffDay, ReconcileError> {
    let staff_id = entry.staff_id;
    let mut slots = BTreeSet::new();
    let mut items = Vec::with_capacity(entry.items.len());

    for item in entry.items {
        let slot = SlotStart::parse(&item.slot_start)
            .map_err(|e| invalid(format!("staff {staff_id}: {e}")))?;
        if !catalog.contains(slot) {
            return Err(invalid(format!(
                "staff {staff_id}: slot {slot} is not in the catalog"
            )));
        }
        if !slots.insert(slot) {
            return Err(invalid(format!("staff {staff_id}: slot {slot} assigned twice")));
        }
        let color = item
            .color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(Color::parse)
            .transpose()
            .map_err(|e| invalid(format!("staff {staff_id}: {e}")))?;

        items.push(Allocation {
            staff_id,
            date,
            slot,
            location_id: item.location_id,
            color,
            icon: item.icon,
            server_id: item.server_id,
        });
    }
    items.sort_by_key(|a| a.slot);

    Ok(StaffDay {
        row: StaffRow {
            staff_id,
            staff_code: entry.staff_code,
            server_id: entry.server_id,
        },
        items,
    })
}

fn invalid(message: String) -> ReconcileError {
    ReconcileError::InvalidResponse(message)
}
