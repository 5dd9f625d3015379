//! Time-based edit lock.
//!
//! A cell is editable only while its slot has not started. Past dates are
//! fully locked, future dates are never time-locked, and today locks slot
//! by slot as the clock passes each start.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{SlotCatalog, SlotStart};

/// Lock rule evaluated against a wall-clock instant.
///
/// Stateless; results are never cached since `now` keeps moving.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockPolicy;

impl LockPolicy {
    /// Whether the cell `(date, slot)` is locked at `now`.
    pub fn is_locked(date: NaiveDate, slot: SlotStart, now: NaiveDateTime) -> bool {
        let today = now.date();
        if date < today {
            return true;
        }
        if date > today {
            return false;
        }
        date.and_time(slot.time()) <= now
    }

    /// First slot of `date` that is still editable at `now`, if any.
    pub fn lock_boundary(
        date: NaiveDate,
        catalog: &SlotCatalog,
        now: NaiveDateTime,
    ) -> Option<SlotStart> {
        catalog
            .starts()
            .find(|slot| !Self::is_locked(date, *slot, now))
    }
}
