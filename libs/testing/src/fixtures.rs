//! Shared fixtures for roster tests.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use roster_grid::{CellKey, ManualClock, SlotStart};
use roster_id::{LocationId, StaffId};

use crate::store::{location, staff};
use crate::InMemoryStore;

/// Monday 2026-03-02.
pub fn monday() -> NaiveDate {
    date(2026, 3, 2)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("bad fixture date {y}-{m}-{d}"))
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| panic!("bad fixture time {hour}:{minute}"))
}

/// Shared clock frozen at `date` `hour:minute`.
pub fn clock_at(date: NaiveDate, hour: u32, minute: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(at(date, hour, minute)))
}

pub fn slot(s: &str) -> SlotStart {
    SlotStart::parse(s).unwrap_or_else(|e| panic!("bad fixture slot: {e}"))
}

pub fn staff_id(n: i64) -> StaffId {
    StaffId::new(n).unwrap_or_else(|e| panic!("bad fixture staff id: {e}"))
}

pub fn location_id(n: i64) -> LocationId {
    LocationId::new(n).unwrap_or_else(|e| panic!("bad fixture location id: {e}"))
}

pub fn cell(staff: i64, at: &str) -> CellKey {
    CellKey::new(staff_id(staff), slot(at))
}

/// Store with three locations and three active staff members.
pub fn sample_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_location(location(1, "Surgical Center", "3B82F6"))
        .with_location(location(2, "Maternity", "#EF4444"))
        .with_location(location(3, "Day Clinic", "10b981"))
        .with_staff(staff(1, "ABC"))
        .with_staff(staff(2, "DEF"))
        .with_staff(staff(3, "GHI"))
}
