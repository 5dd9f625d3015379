//! Read-only weekly overview built from seven day matrices.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use roster_id::{LocationId, StaffId};
use serde::Serialize;

use crate::{DayMatrix, GridError};

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

/// One staff member's week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffWeek {
    pub staff_id: StaffId,
    pub staff_code: Option<String>,
    /// Allocated slot count per weekday, Monday first.
    pub slots_per_day: [usize; 7],
}

impl StaffWeek {
    pub fn total(&self) -> usize {
        self.slots_per_day.iter().sum()
    }
}

/// Aggregated view of a Monday..Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekMatrix {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub staff: Vec<StaffWeek>,
    pub location_totals: BTreeMap<LocationId, usize>,
}

impl WeekMatrix {
    /// Build the week containing `date` from whichever days are given.
    ///
    /// Missing days count as empty. A day outside the week is rejected.
    pub fn from_days<'a, I>(date: NaiveDate, days: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = &'a DayMatrix>,
    {
        let (start, end) = week_bounds(date);
        let mut staff: BTreeMap<StaffId, StaffWeek> = BTreeMap::new();
        let mut location_totals = BTreeMap::new();

        for day in days {
            let d = day.date();
            if d < start || d > end {
                return Err(GridError::invalid(format!(
                    "{d} is outside the week {start}..{end}"
                )));
            }
            let index = d.weekday().num_days_from_monday() as usize;

            for row in day.rows() {
                let entry = staff.entry(row.staff_id).or_insert_with(|| StaffWeek {
                    staff_id: row.staff_id,
                    staff_code: None,
                    slots_per_day: [0; 7],
                });
                if entry.staff_code.is_none() {
                    entry.staff_code = row.staff_code.clone();
                }
                entry.slots_per_day[index] = day.allocations_for(row.staff_id).len();
            }
            for allocation in day.allocations() {
                *location_totals.entry(allocation.location_id).or_insert(0) += 1;
            }
        }

        Ok(Self {
            start,
            end,
            staff: staff.into_values().collect(),
            location_totals,
        })
    }

    /// The seven dates of the week.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..7).map(|i| self.start + Duration::days(i))
    }

    pub fn staff_week(&self, staff_id: StaffId) -> Option<&StaffWeek> {
        self.staff.iter().find(|s| s.staff_id == staff_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Location, ManualClock, SlotCatalog, SlotStart};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-03-04 is a Wednesday.
        assert_eq!(week_bounds(date(2026, 3, 4)), (date(2026, 3, 2), date(2026, 3, 8)));
        assert_eq!(week_bounds(date(2026, 3, 2)), (date(2026, 3, 2), date(2026, 3, 8)));
        assert_eq!(week_bounds(date(2026, 3, 8)), (date(2026, 3, 2), date(2026, 3, 8)));
        // Crosses a month boundary.
        assert_eq!(week_bounds(date(2026, 3, 1)), (date(2026, 2, 23), date(2026, 3, 1)));
    }

    #[test]
    fn test_from_days_counts_slots() {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(
            date(2026, 2, 1).and_hms_opt(0, 0, 0).unwrap(),
        ));
        let catalog = Arc::new(SlotCatalog::default());
        let staff = StaffId::new(1).unwrap();
        let loc = Location::new(LocationId::new(2).unwrap(), None, None);

        let mut tuesday = DayMatrix::new(date(2026, 3, 3), catalog.clone(), clock.clone());
        tuesday.ensure_row(staff, Some("ABC"));
        for h in [8, 9, 10] {
            tuesday.set(staff, SlotStart::new(h, 0).unwrap(), &loc).unwrap();
        }
        let mut friday = DayMatrix::new(date(2026, 3, 6), catalog.clone(), clock.clone());
        friday.set(staff, SlotStart::new(12, 0).unwrap(), &loc).unwrap();

        let week = WeekMatrix::from_days(date(2026, 3, 4), [&tuesday, &friday]).unwrap();
        let row = week.staff_week(staff).unwrap();
        assert_eq!(row.slots_per_day, [0, 3, 0, 0, 1, 0, 0]);
        assert_eq!(row.total(), 4);
        assert_eq!(row.staff_code.as_deref(), Some("ABC"));
        assert_eq!(week.location_totals[&LocationId::new(2).unwrap()], 4);
        assert_eq!(week.dates().count(), 7);

        let outside = DayMatrix::new(date(2026, 3, 9), catalog, clock);
        assert!(WeekMatrix::from_days(date(2026, 3, 4), [&outside]).is_err());
    }
}
