//! Date navigation across roster days.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use roster_grid::{week_bounds, Clock, Location, SlotCatalog, Staff, WeekMatrix};
use roster_id::LocationId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{load_matrix, DaySession, ReconcileError, RosterStore, StaffFilter};

/// What happens to pending edits when the operator leaves a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationPolicy {
    /// Submit pending edits first; stay on the date if that fails.
    #[default]
    Flush,
    /// Drop pending edits.
    Discard,
}

impl std::fmt::Display for NavigationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationPolicy::Flush => f.write_str("flush"),
            NavigationPolicy::Discard => f.write_str("discard"),
        }
    }
}

impl FromStr for NavigationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flush" => Ok(NavigationPolicy::Flush),
            "discard" => Ok(NavigationPolicy::Discard),
            other => Err(format!("unknown navigation policy '{other}' (expected flush or discard)")),
        }
    }
}

/// Reference data plus the currently open day.
pub struct Roster<S> {
    store: Arc<S>,
    catalog: Arc<SlotCatalog>,
    clock: Arc<dyn Clock>,
    locations: Vec<Location>,
    staff: Vec<Staff>,
    session: Option<DaySession<S>>,
}

impl<S: RosterStore> Roster<S> {
    pub fn new(store: Arc<S>, catalog: Arc<SlotCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            catalog,
            clock,
            locations: Vec::new(),
            staff: Vec::new(),
            session: None,
        }
    }

    /// Fetch active locations and staff.
    pub async fn load_reference_data(&mut self) -> Result<(), ReconcileError> {
        self.locations = self
            .store
            .list_locations(true)
            .await
            .map_err(|source| ReconcileError::Load {
                what: "locations".into(),
                source,
            })?;
        self.staff = self
            .store
            .list_staff(&StaffFilter::active())
            .await
            .map_err(|source| ReconcileError::Load {
                what: "staff".into(),
                source,
            })?;
        info!(
            locations = self.locations.len(),
            staff = self.staff.len(),
            "loaded reference data"
        );
        Ok(())
    }

    pub fn catalog(&self) -> &Arc<SlotCatalog> {
        &self.catalog
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    pub fn session(&self) -> Option<&DaySession<S>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DaySession<S>> {
        self.session.as_mut()
    }

    /// Open `date`, leaving the current date according to `policy`.
    ///
    /// With [`NavigationPolicy::Flush`] a failed submission refuses the
    /// switch and the current session keeps its pending edits.
    pub async fn switch_date(
        &mut self,
        date: NaiveDate,
        policy: NavigationPolicy,
    ) -> Result<&mut DaySession<S>, ReconcileError> {
        if let Some(current) = self.session.as_mut() {
            match policy {
                NavigationPolicy::Flush => {
                    current.sync().await?;
                }
                NavigationPolicy::Discard if current.phase().has_pending() => {
                    warn!(
                        date = %current.date(),
                        touched = current.matrix().touched_staff().len(),
                        "discarding unsubmitted roster edits"
                    );
                }
                NavigationPolicy::Discard => {}
            }
        }

        let session = DaySession::open(
            date,
            self.store.clone(),
            self.catalog.clone(),
            self.clock.clone(),
        )
        .await?;
        Ok(self.session.insert(session))
    }

    /// Aggregate the Monday..Sunday week containing `date`.
    ///
    /// The open day contributes its local state, pending edits included.
    pub async fn load_week(&self, date: NaiveDate) -> Result<WeekMatrix, ReconcileError> {
        let (monday, _) = week_bounds(date);
        let open = self.session.as_ref().map(|s| s.date());

        let mut days = Vec::with_capacity(7);
        for offset in 0..7 {
            let day = monday + Duration::days(offset);
            if Some(day) == open {
                continue;
            }
            let entries = self
                .store
                .fetch_day(day)
                .await
                .map_err(|e| ReconcileError::load_day(day, e))?;
            days.push(load_matrix(
                day,
                self.catalog.clone(),
                self.clock.clone(),
                entries,
            )?);
        }

        let current = self
            .session
            .as_ref()
            .map(DaySession::matrix)
            .filter(|m| week_bounds(m.date()).0 == monday);
        WeekMatrix::from_days(date, days.iter().chain(current))
            .map_err(|e| ReconcileError::InvalidResponse(e.to_string()))
    }
}
