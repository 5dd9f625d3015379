//! In-memory [`RosterStore`] with the remote store's save semantics.
//!
//! Each submitted entry is a full replacement of one staff member's day:
//! items carrying a known id are updated in place, items without an id are
//! inserted, stored items not mentioned are deleted, and an entry left with
//! no items deletes the record and is absent from the answer. A staff member
//! holds at most one record per date and one item per slot.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use roster_grid::{Color, Icon, Location, SlotStart, Staff};
use roster_id::{ItemId, LocationId, RosterId, StaffId};
use roster_reconcile::{DayEntryDto, ItemDto, RosterStore, StaffFilter, StoreError};
use tracing::debug;

/// One call received by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListLocations { active_only: bool },
    ListStaff { filter: StaffFilter },
    FetchDay { date: NaiveDate },
    SubmitDay { date: NaiveDate, entries: Vec<DayEntryDto> },
}

#[derive(Debug, Clone)]
struct StoredItem {
    id: ItemId,
    location_id: LocationId,
    slot: SlotStart,
}

#[derive(Debug, Clone)]
struct Record {
    staff_id: StaffId,
    date: NaiveDate,
    items: Vec<StoredItem>,
}

#[derive(Debug, Default)]
struct State {
    locations: Vec<Location>,
    staff: Vec<Staff>,
    records: BTreeMap<RosterId, Record>,
    next_roster: i64,
    next_item: i64,
    fetch_failures: VecDeque<StoreError>,
    submit_failures: VecDeque<StoreError>,
    answer_overrides: VecDeque<Vec<DayEntryDto>>,
    omit_from_answer: BTreeSet<StaffId>,
    calls: Vec<StoreCall>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub fn with_location(self, location: Location) -> Self {
        self.state().locations.push(location);
        self
    }

    pub fn with_staff(self, staff: Staff) -> Self {
        self.state().staff.push(staff);
        self
    }

    /// Store an item directly, creating the staff record if needed.
    pub fn seed_item(
        &self,
        date: NaiveDate,
        staff_id: StaffId,
        slot: SlotStart,
        location_id: LocationId,
    ) -> (RosterId, ItemId) {
        let mut state = self.state();
        let roster_id = match state.record_for(staff_id, date) {
            Some(id) => id,
            None => {
                let id = state.next_roster_id();
                state.records.insert(
                    id,
                    Record {
                        staff_id,
                        date,
                        items: Vec::new(),
                    },
                );
                id
            }
        };
        let item_id = state.next_item_id();
        if let Some(record) = state.records.get_mut(&roster_id) {
            record.items.retain(|i| i.slot != slot);
            record.items.push(StoredItem {
                id: item_id,
                location_id,
                slot,
            });
        }
        (roster_id, item_id)
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Fail the next `fetch_day` with `error`.
    pub fn fail_next_fetch(&self, error: StoreError) {
        self.state().fetch_failures.push_back(error);
    }

    /// Fail the next `submit_day` with `error` without storing anything.
    pub fn fail_next_submit(&self, error: StoreError) {
        self.state().submit_failures.push_back(error);
    }

    /// Store the next submission normally but answer with `entries`.
    pub fn answer_next_submit_with(&self, entries: Vec<DayEntryDto>) {
        self.state().answer_overrides.push_back(entries);
    }

    /// Leave `staff_id` out of every submit answer, as if its items were
    /// silently dropped.
    pub fn omit_from_answers(&self, staff_id: StaffId) {
        self.state().omit_from_answer.insert(staff_id);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Entries passed to `submit_day`, in call order.
    pub fn submissions(&self) -> Vec<Vec<DayEntryDto>> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::SubmitDay { entries, .. } => Some(entries.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(slot, location)` pairs stored for a staff member.
    pub fn stored_items(&self, date: NaiveDate, staff_id: StaffId) -> Vec<(SlotStart, LocationId)> {
        let state = self.state();
        let mut items: Vec<_> = state
            .record_for(staff_id, date)
            .and_then(|id| state.records.get(&id))
            .map(|r| r.items.iter().map(|i| (i.slot, i.location_id)).collect())
            .unwrap_or_default();
        items.sort();
        items
    }

    pub fn record_count(&self, date: NaiveDate) -> usize {
        self.state().records.values().filter(|r| r.date == date).count()
    }
}

impl State {
    fn next_roster_id(&mut self) -> RosterId {
        self.next_roster += 1;
        RosterId::new(self.next_roster).unwrap_or_else(|_| unreachable!("ids start at 1"))
    }

    fn next_item_id(&mut self) -> ItemId {
        self.next_item += 1;
        ItemId::new(self.next_item).unwrap_or_else(|_| unreachable!("ids start at 1"))
    }

    fn record_for(&self, staff_id: StaffId, date: NaiveDate) -> Option<RosterId> {
        self.records
            .iter()
            .find(|(_, r)| r.staff_id == staff_id && r.date == date)
            .map(|(id, _)| *id)
    }

    fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    fn staff_code(&self, id: StaffId) -> Option<String> {
        self.staff.iter().find(|s| s.id == id).map(|s| s.code.clone())
    }

    fn to_dto(&self, id: RosterId, record: &Record) -> DayEntryDto {
        let mut items: Vec<&StoredItem> = record.items.iter().collect();
        items.sort_by_key(|i| i.slot);
        DayEntryDto {
            server_id: Some(id),
            staff_id: record.staff_id,
            staff_code: self.staff_code(record.staff_id),
            date: record.date,
            items: items
                .into_iter()
                .map(|i| {
                    let location = self.location(i.location_id);
                    ItemDto {
                        server_id: Some(i.id),
                        location_id: i.location_id,
                        // The store speaks LocalTime.
                        slot_start: format!("{}:00", i.slot),
                        color: location
                            .and_then(|l| l.color.as_ref())
                            .map(|c| c.as_str().trim_start_matches('#').to_uppercase()),
                        icon: location.and_then(|l| l.icon.clone()),
                    }
                })
                .collect(),
        }
    }

    /// Apply one entry. On error the caller rolls back the records.
    fn save_entry(&mut self, date: NaiveDate, entry: &DayEntryDto) -> Result<Option<RosterId>, StoreError> {
        if entry.date != date {
            return Err(rejected(400, format!("entry for staff {} has date {}", entry.staff_id, entry.date)));
        }

        let mut slots = BTreeSet::new();
        let mut parsed = Vec::with_capacity(entry.items.len());
        for item in &entry.items {
            if self.location(item.location_id).is_none() {
                return Err(rejected(404, format!("location {} not found", item.location_id)));
            }
            let slot = SlotStart::parse(&item.slot_start).map_err(|e| rejected(400, e.to_string()))?;
            if !slots.insert(slot) {
                return Err(rejected(
                    409,
                    format!("staff {} already holds slot {slot}", entry.staff_id),
                ));
            }
            parsed.push((item, slot));
        }

        let roster_id = match entry.server_id {
            Some(id) => {
                let record = self
                    .records
                    .get(&id)
                    .ok_or_else(|| rejected(404, format!("roster {id} not found")))?;
                if record.staff_id != entry.staff_id || record.date != date {
                    return Err(rejected(409, format!("roster {id} belongs to another staff or date")));
                }
                id
            }
            None => {
                if self.record_for(entry.staff_id, date).is_some() {
                    return Err(rejected(
                        409,
                        format!("staff {} already has a roster on {date}", entry.staff_id),
                    ));
                }
                let id = self.next_roster_id();
                self.records.insert(
                    id,
                    Record {
                        staff_id: entry.staff_id,
                        date,
                        items: Vec::new(),
                    },
                );
                id
            }
        };

        let mut next_items = Vec::with_capacity(parsed.len());
        for (item, slot) in parsed {
            match item.server_id {
                None => {
                    let id = self.next_item_id();
                    next_items.push(StoredItem {
                        id,
                        location_id: item.location_id,
                        slot,
                    });
                }
                Some(id) => {
                    // Unknown item ids are dropped, matching the remote store.
                    let known = self
                        .records
                        .get(&roster_id)
                        .is_some_and(|r| r.items.iter().any(|i| i.id == id));
                    if known {
                        next_items.push(StoredItem {
                            id,
                            location_id: item.location_id,
                            slot,
                        });
                    }
                }
            }
        }

        if next_items.is_empty() {
            self.records.remove(&roster_id);
            return Ok(None);
        }
        if let Some(record) = self.records.get_mut(&roster_id) {
            record.items = next_items;
        }
        Ok(Some(roster_id))
    }
}

fn rejected(status: u16, message: String) -> StoreError {
    StoreError::Rejected { status, message }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn list_locations(&self, active_only: bool) -> Result<Vec<Location>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::ListLocations { active_only });
        Ok(state
            .locations
            .iter()
            .filter(|l| !active_only || l.active)
            .cloned()
            .collect())
    }

    async fn list_staff(&self, filter: &StaffFilter) -> Result<Vec<Staff>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::ListStaff {
            filter: filter.clone(),
        });
        let mut staff: Vec<Staff> = state.staff.iter().filter(|s| filter.matches(s)).cloned().collect();
        staff.sort_by_key(|s| s.id);
        Ok(staff)
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<DayEntryDto>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::FetchDay { date });
        if let Some(err) = state.fetch_failures.pop_front() {
            return Err(err);
        }

        let mut staff: Vec<&Staff> = state.staff.iter().filter(|s| s.active).collect();
        staff.sort_by_key(|s| s.id);
        Ok(staff
            .into_iter()
            .map(|s| match state.record_for(s.id, date) {
                Some(id) => state.to_dto(id, &state.records[&id]),
                None => DayEntryDto {
                    server_id: None,
                    staff_id: s.id,
                    staff_code: Some(s.code.clone()),
                    date,
                    items: Vec::new(),
                },
            })
            .collect())
    }

    async fn submit_day(
        &self,
        date: NaiveDate,
        entries: Vec<DayEntryDto>,
    ) -> Result<Vec<DayEntryDto>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::SubmitDay {
            date,
            entries: entries.clone(),
        });
        if let Some(err) = state.submit_failures.pop_front() {
            return Err(err);
        }

        // All or nothing: work on a copy and commit at the end.
        let records = state.records.clone();
        let counters = (state.next_roster, state.next_item);
        let mut saved = Vec::new();
        for entry in &entries {
            match state.save_entry(date, entry) {
                Ok(Some(id)) => saved.push(id),
                Ok(None) => {}
                Err(err) => {
                    state.records = records;
                    state.next_roster = counters.0;
                    state.next_item = counters.1;
                    return Err(err);
                }
            }
        }
        debug!(date = %date, entries = entries.len(), saved = saved.len(), "in-memory submit");

        if let Some(answer) = state.answer_overrides.pop_front() {
            return Ok(answer);
        }
        Ok(saved
            .into_iter()
            .filter_map(|id| state.records.get(&id).map(|r| state.to_dto(id, r)))
            .filter(|e| !state.omit_from_answer.contains(&e.staff_id))
            .collect())
    }
}

/// Convenience constructor for a location with a hex color.
pub fn location(id: i64, name: &str, color: &str) -> Location {
    Location {
        id: LocationId::new(id).unwrap_or_else(|e| panic!("bad fixture location id: {e}")),
        name: name.to_string(),
        color: Color::parse(color).ok(),
        icon: Some(Icon::from_bytes(vec![0x89, b'P', b'N', b'G'])),
        active: true,
    }
}

/// Convenience constructor for an active staff member.
pub fn staff(id: i64, code: &str) -> Staff {
    Staff {
        id: StaffId::new(id).unwrap_or_else(|e| panic!("bad fixture staff id: {e}")),
        code: code.to_string(),
        name: None,
        active: true,
    }
}
