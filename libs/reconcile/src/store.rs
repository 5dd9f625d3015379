//! Remote collaborator interface.
//!
//! The store owns persistence. The grid only reads reference data, loads a
//! day and submits full per-staff replacements for it.

use async_trait::async_trait;
use chrono::NaiveDate;
use roster_grid::{Location, Staff};

use crate::{DayEntryDto, StoreError};

/// Staff listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffFilter {
    pub active_only: bool,

    /// Case-insensitive match on code or name.
    pub query: Option<String>,
}

impl StaffFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Whether `staff` passes this filter.
    pub fn matches(&self, staff: &Staff) -> bool {
        if self.active_only && !staff.active {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                staff.code.to_lowercase().contains(&q)
                    || staff
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&q))
            }
        }
    }
}

/// Persistence backend for roster days.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Locations that can be assigned.
    async fn list_locations(&self, active_only: bool) -> Result<Vec<Location>, StoreError>;

    /// Staff that can be rostered.
    async fn list_staff(&self, filter: &StaffFilter) -> Result<Vec<Staff>, StoreError>;

    /// One entry per active staff member for `date`, empty rows included.
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<DayEntryDto>, StoreError>;

    /// Apply full per-staff replacements for `date`.
    ///
    /// Returns the stored entries. Staff whose items were all deleted are
    /// absent from the answer.
    async fn submit_day(
        &self,
        date: NaiveDate,
        entries: Vec<DayEntryDto>,
    ) -> Result<Vec<DayEntryDto>, StoreError>;
}
